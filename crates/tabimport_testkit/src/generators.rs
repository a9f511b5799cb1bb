//! Property-based test generators using proptest.
//!
//! Strategies produce values that survive a trip through a CSV cell, so
//! generated people can be written to a sheet and read back unchanged.

use crate::fixtures::Person;
use chrono::NaiveDate;
use proptest::prelude::*;
use tabimport_engine::{ImportInstructions, ImportStatus};

/// Strategy for generating display names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{1,11}( [A-Z][a-z]{1,11})?").expect("Invalid regex")
}

/// Strategy for generating e-mail addresses.
pub fn email_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}@[a-z]{2,8}\\.(com|org|net)").expect("Invalid regex")
}

/// Strategy for generating calendar days between 1900 and 2099.
pub fn day_strategy() -> impl Strategy<Value = NaiveDate> {
    (1900i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("Day in range"))
}

/// Strategy for generating unsaved people with optional fields.
pub fn person_strategy() -> impl Strategy<Value = Person> {
    (
        prop::option::of(name_strategy()),
        prop::option::of(email_strategy()),
        prop::option::of(day_strategy()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(name, email, birth_date, active)| Person {
            name,
            email,
            birth_date,
            active,
            ..Person::default()
        })
}

/// Strategy for generating every combination of the six flags.
pub fn instructions_strategy() -> impl Strategy<Value = ImportInstructions> {
    any::<[bool; 6]>().prop_map(|[insert, update, merge, remove, force, sync]| {
        ImportInstructions::new()
            .with_insert(insert)
            .with_update(update)
            .with_merge(merge)
            .with_remove(remove)
            .with_force(force)
            .with_sync(sync)
    })
}

/// Strategy for picking any status.
pub fn status_strategy() -> impl Strategy<Value = ImportStatus> {
    prop::sample::select(ImportStatus::ALL.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabimport_entity::Entity;

    proptest! {
        #[test]
        fn generated_people_are_unsaved(person in person_strategy()) {
            prop_assert!(person.id().is_none());
            prop_assert!(person.audit().version.is_none());
        }

        #[test]
        fn names_never_blank(name in name_strategy()) {
            prop_assert!(!name.trim().is_empty());
        }
    }
}
