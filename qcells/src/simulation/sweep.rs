//! Parameter sweeps.

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Varies one parameter of `base` at a time.
///
/// Returns one parameter set per swept value, in order, each named
/// `<name>_<key>_<value>`. Parameters are matched by their serialized names,
/// and `base` must have a `name` field.
///
/// ```
/// # use indexmap::IndexMap;
/// # use qcells::simulation::{sweep_simulation, WaveGuidesSim};
/// let sweep = IndexMap::from([("n_guides".to_string(), vec![1.into(), 2.into()])]);
/// let sims = sweep_simulation(&WaveGuidesSim::default(), &sweep).unwrap();
/// assert_eq!(sims[1].name, "waveguides_n_guides_2");
/// assert_eq!(sims[1].n_guides, 2);
/// ```
pub fn sweep_simulation<T>(base: &T, sweep: &IndexMap<String, Vec<Value>>) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(params) = serde_json::to_value(base)? else {
        return Err(Error::invalid("swept parameters must serialize to a map"));
    };
    let name = match params.get("name") {
        Some(Value::String(name)) => name.clone(),
        _ => return Err(Error::invalid("swept parameters need a `name`")),
    };

    let mut out = Vec::new();
    for (key, values) in sweep {
        if !params.contains_key(key) {
            return Err(Error::InvalidParameter(arcstr::format!(
                "no parameter `{key}` to sweep"
            )));
        }
        for value in values {
            let mut swept = params.clone();
            swept.insert(key.clone(), value.clone());
            let label: ArcStr = match value {
                Value::String(s) => s.as_str().into(),
                other => arcstr::format!("{other}"),
            };
            swept.insert(
                "name".to_string(),
                Value::String(format!("{name}_{key}_{label}")),
            );
            tracing::debug!(%key, %label, "sweep point");
            out.push(serde_json::from_value(Value::Object(swept))?);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::WaveGuidesSim;

    #[test]
    fn sweeps_each_key_in_turn() {
        let sweep = IndexMap::from([
            ("n_guides".to_string(), vec![1.into(), 2.into(), 3.into()]),
            ("a".to_string(), vec![5.5.into()]),
        ]);
        let sims = sweep_simulation(&WaveGuidesSim::default(), &sweep).unwrap();
        let names: Vec<_> = sims.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "waveguides_n_guides_1",
                "waveguides_n_guides_2",
                "waveguides_n_guides_3",
                "waveguides_a_5.5",
            ]
        );
        assert_eq!(sims[3].a, 5.5);
        assert_eq!(sims[3].n_guides, 1);
    }

    #[test]
    fn unknown_key() {
        let sweep = IndexMap::from([("guides".to_string(), vec![1.into()])]);
        assert!(matches!(
            sweep_simulation(&WaveGuidesSim::default(), &sweep),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn wrong_type_is_reported() {
        let sweep = IndexMap::from([("n_guides".to_string(), vec!["many".into()])]);
        assert!(matches!(
            sweep_simulation(&WaveGuidesSim::default(), &sweep),
            Err(Error::Json(_))
        ));
    }
}
