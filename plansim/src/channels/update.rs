//! `state_update!`: declares a state's partial-update type and merge schema in one place.

/// Declares the partial-update struct for a state type.
///
/// Each line is `<policy> <field>: <type>` where `<type>` is the field's type in the state and
/// `<policy>` is one of `append` (type must implement `Extend`), `replace`, or `set_once`
/// (type must be `Option<_>`). The generated struct wraps every field in `Option` and derives
/// `Default`, so nodes build updates with `..Default::default()`.
#[macro_export]
macro_rules! state_update {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident for $state:ty {
            $(
                $(#[$fmeta:meta])*
                $policy:ident $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: ::std::option::Option<$ty>,
            )*
        }

        impl $crate::channels::StateUpdate<$state> for $name {
            const FIELDS: &'static [$crate::channels::FieldPolicy] = &[
                $(
                    $crate::channels::FieldPolicy {
                        name: ::std::stringify!($field),
                        policy: $crate::__merge_policy!($policy),
                    },
                )*
            ];

            fn touched_fields(&self) -> ::std::vec::Vec<&'static str> {
                let mut touched = ::std::vec::Vec::new();
                $(
                    if self.$field.is_some() {
                        touched.push(::std::stringify!($field));
                    }
                )*
                touched
            }

            fn apply_to(self, state: &mut $state) -> $crate::channels::MergeReport {
                let mut report = $crate::channels::MergeReport::default();
                $(
                    if let ::std::option::Option::Some(value) = self.$field {
                        if $crate::__merge_field!($policy, state.$field, value) {
                            report.applied.push(::std::stringify!($field));
                        } else {
                            report.rejected.push(::std::stringify!($field));
                        }
                    }
                )*
                report
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __merge_policy {
    (append) => {
        $crate::channels::MergePolicy::Append
    };
    (replace) => {
        $crate::channels::MergePolicy::Replace
    };
    (set_once) => {
        $crate::channels::MergePolicy::SetOnce
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __merge_field {
    (append, $current:expr, $value:expr) => {{
        ::std::iter::Extend::extend(&mut $current, $value);
        true
    }};
    (replace, $current:expr, $value:expr) => {{
        $current = $value;
        true
    }};
    (set_once, $current:expr, $value:expr) => {
        $crate::channels::set_once(&mut $current, $value)
    };
}

#[cfg(test)]
mod tests {
    use crate::channels::{GraphState, MergePolicy, StateUpdate};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Ledger {
        entries: Vec<String>,
        balance: f64,
        closed_by: Option<String>,
    }

    crate::state_update! {
        struct LedgerUpdate for Ledger {
            append entries: Vec<String>,
            replace balance: f64,
            set_once closed_by: Option<String>,
        }
    }

    impl GraphState for Ledger {
        type Update = LedgerUpdate;
    }

    /// **Scenario**: Schema lists fields in declaration order with their policies.
    #[test]
    fn schema_is_declared_once() {
        let names: Vec<_> = LedgerUpdate::FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names, ["entries", "balance", "closed_by"]);
        assert_eq!(LedgerUpdate::policy_of("entries"), Some(MergePolicy::Append));
        assert_eq!(LedgerUpdate::policy_of("balance"), Some(MergePolicy::Replace));
        assert_eq!(LedgerUpdate::policy_of("closed_by"), Some(MergePolicy::SetOnce));
        assert_eq!(LedgerUpdate::policy_of("missing"), None);
    }

    /// **Scenario**: Append concatenates, Replace overwrites, omitted fields are untouched.
    #[test]
    fn append_and_replace_merge() {
        let mut state = Ledger {
            entries: vec!["a".into()],
            balance: 10.0,
            closed_by: None,
        };
        let report = LedgerUpdate {
            entries: Some(vec!["b".into(), "c".into()]),
            ..Default::default()
        }
        .apply_to(&mut state);
        assert_eq!(state.entries, ["a", "b", "c"]);
        assert_eq!(state.balance, 10.0);
        assert_eq!(report.applied, ["entries"]);

        LedgerUpdate {
            balance: Some(-2.5),
            ..Default::default()
        }
        .apply_to(&mut state);
        assert_eq!(state.balance, -2.5);
        assert_eq!(state.entries.len(), 3);
    }

    /// **Scenario**: A SetOnce field keeps its first value and reports later writes as rejected.
    #[test]
    fn set_once_rejects_second_write() {
        let mut state = Ledger::default();
        let first = LedgerUpdate {
            closed_by: Some(Some("alice".into())),
            ..Default::default()
        };
        assert!(first.apply_to(&mut state).rejected.is_empty());
        let second = LedgerUpdate {
            closed_by: Some(Some("bob".into())),
            entries: Some(vec!["late".into()]),
            ..Default::default()
        };
        let report = second.apply_to(&mut state);
        assert_eq!(report.rejected, ["closed_by"]);
        assert_eq!(report.applied, ["entries"]);
        assert_eq!(state.closed_by.as_deref(), Some("alice"));
    }

    #[test]
    fn touched_fields_lists_present_only() {
        let update = LedgerUpdate {
            balance: Some(1.0),
            ..Default::default()
        };
        assert_eq!(update.touched_fields(), ["balance"]);
        assert!(LedgerUpdate::default().touched_fields().is_empty());
    }
}
