//! # Parameter Resolution Tests
//!
//! - Merging keeps exactly the class-default keys
//! - Unknown keys are always rejected
//! - Per-call resolution never leaks into instance defaults

use conduit_core::params::{build_defaults, resolve_call, NoValidation};
use conduit_core::{ParamSet, ParamStore, ParamValue};
use proptest::prelude::*;

const KEYS: [&str; 5] = ["rate", "scale", "offset", "slope", "intercept"];

fn class_defaults() -> ParamSet {
    KEYS.iter().map(|k| (*k, 1.0)).collect()
}

fn key_names(set: &ParamSet) -> Vec<String> {
    set.keys().map(str::to_string).collect()
}

// ============================================================================
// Examples
// ============================================================================

#[test]
fn test_no_overrides_yields_class_defaults() {
    let inst = build_defaults("Linear", &class_defaults(), None).unwrap();
    assert_eq!(inst, class_defaults());
}

#[test]
fn test_call_overrides_are_scoped_to_the_call() {
    let store = ParamStore::new("Linear", class_defaults(), None, &NoValidation).unwrap();
    let call = ParamSet::new().with("slope", 4.0);
    let current = store.current(Some(&call), &NoValidation).unwrap();

    assert_eq!(current.number("Linear", "slope").unwrap(), 4.0);
    assert_eq!(store.instance_defaults().number("Linear", "slope").unwrap(), 1.0);
    assert_eq!(store.class_defaults(), &class_defaults());
}

#[test]
fn test_unset_override_clears_value_but_keeps_key() {
    let call = ParamSet::new().with_unset("rate");
    let current = resolve_call("Integrator", &class_defaults(), Some(&call)).unwrap();
    assert!(current.contains_key("rate"));
    assert_eq!(current.get("rate"), None);
}

#[test]
fn test_nested_sets_replace_shallowly() {
    let class = ParamSet::new().with(
        "function_params",
        ParamSet::new().with("matrix", "IdentityMatrix"),
    );
    let overrides = ParamSet::new().with("function_params", ParamSet::new().with("matrix", 0.5));
    let inst = build_defaults("Mapping", &class, Some(&overrides)).unwrap();
    let nested = inst.set("Mapping", "function_params").unwrap();
    assert_eq!(nested.get("matrix"), Some(&ParamValue::Number(0.5)));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn merge_closure(subset in prop::sample::subsequence(KEYS.to_vec(), 0..=KEYS.len()),
                     value in -10f64..10.0) {
        let overrides: ParamSet = subset.iter().map(|k| (*k, value)).collect();
        let inst = build_defaults("entity", &class_defaults(), Some(&overrides)).unwrap();
        let current = resolve_call("entity", &inst, Some(&ParamSet::new())).unwrap();
        prop_assert_eq!(key_names(&current), key_names(&class_defaults()));
    }

    #[test]
    fn unknown_keys_rejected(key in "[a-z]{1,12}", value in -10f64..10.0) {
        prop_assume!(!KEYS.contains(&key.as_str()));
        let overrides = ParamSet::new().with("rate", 2.0).with(key.clone(), value);
        let built = build_defaults("entity", &class_defaults(), Some(&overrides));
        prop_assert!(built.as_ref().is_err_and(|e| e.is_configuration()));
        let called = resolve_call("entity", &class_defaults(), Some(&overrides));
        prop_assert!(called.as_ref().is_err_and(|e| e.is_configuration()));
    }
}
