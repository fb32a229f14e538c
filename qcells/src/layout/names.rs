//! Unique cell name assignment.

use std::collections::HashSet;

use arcstr::ArcStr;

/// A set of unique cell names.
#[derive(Debug, Clone, Default)]
pub(crate) struct Names {
    names: HashSet<ArcStr>,
}

impl Names {
    /// Allocates a new, unique name.
    ///
    /// The name is `base_name` if still free, otherwise `base_name_1`,
    /// `base_name_2`, and so on.
    pub(crate) fn assign_name(&mut self, base_name: &str) -> ArcStr {
        let name = if self.names.contains(base_name) {
            let mut i = 1;
            loop {
                let new_name = arcstr::format!("{}_{}", base_name, i);
                if !self.names.contains(&new_name) {
                    break new_name;
                }
                i += 1;
            }
        } else {
            base_name.into()
        };

        self.names.insert(name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clashing_names_get_suffixes() {
        let mut names = Names::default();
        assert_eq!(names.assign_name("Meander"), "Meander");
        assert_eq!(names.assign_name("Meander"), "Meander_1");
        assert_eq!(names.assign_name("Meander_1"), "Meander_1_1");
        assert_eq!(names.assign_name("Meander"), "Meander_2");
    }
}
