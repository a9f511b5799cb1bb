//! Benchmark utilities.

#![warn(missing_docs)]

use tabimport_testkit::Person;

/// Generates `count` people named `person-<n>`, with ids `1..=count` if `with_ids`.
pub fn people(count: usize, with_ids: bool) -> Vec<Person> {
    (1..=count)
        .map(|n| {
            let name = format!("person-{n}");
            let mut person = Person::named(&name).email(&format!("{name}@example.com"));
            if with_ids {
                person.id = Some(n as i64);
            }
            person
        })
        .collect()
}

/// Renders a people sheet with `ID,NAME,EMAIL,VERSION` and the given flag columns set to `Y`.
pub fn people_csv(count: usize, with_ids: bool, flags: &[&str]) -> String {
    let mut csv = String::from("ID,NAME,EMAIL,VERSION");
    for flag in flags {
        csv.push(',');
        csv.push_str(flag);
    }
    csv.push('\n');

    for person in people(count, with_ids) {
        let id = person.id.map(|id| id.to_string()).unwrap_or_default();
        let version = if with_ids { "0" } else { "" };
        csv.push_str(&format!(
            "{id},{},{},{version}",
            person.name.unwrap_or_default(),
            person.email.unwrap_or_default()
        ));
        for _ in flags {
            csv.push_str(",Y");
        }
        csv.push('\n');
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_shape() {
        let csv = people_csv(2, true, &["MERGE", "SYNC"]);
        assert_eq!(
            csv,
            "ID,NAME,EMAIL,VERSION,MERGE,SYNC\n\
             1,person-1,person-1@example.com,0,Y,Y\n\
             2,person-2,person-2@example.com,0,Y,Y\n"
        );
    }
}
