//! Detects offerings that gained space between two catalog snapshots.

use std::collections::BTreeSet;

use sectioning_core::types::id::OfferingId;
use sectioning_entity::catalog::CatalogSnapshot;

/// Offerings of `new` where a limit grew (or became unlimited), a section
/// was un-cancelled, or a section or configuration was added.
pub fn changed_offerings(old: &CatalogSnapshot, new: &CatalogSnapshot) -> Vec<OfferingId> {
    let mut changed = BTreeSet::new();
    for offering in new.offerings() {
        if old.offering(offering.id).is_none() {
            changed.insert(offering.id);
            continue;
        }
        let courses = offering.courses.iter().filter_map(|id| new.course(*id));
        for course in courses {
            let grew = old.course(course.id).is_none_or(|o| grew(o.limit, course.limit));
            if grew {
                changed.insert(offering.id);
            }
        }
        for config in new.configs_of(offering) {
            match old.config(config.id) {
                Some(o) if !grew(o.limit, config.limit) => {}
                _ => {
                    changed.insert(offering.id);
                }
            }
            for subpart in new.subparts_of(config) {
                for section in new.sections_of(subpart) {
                    let opened = match old.section(section.id) {
                        None => !section.cancelled,
                        Some(o) => {
                            (o.cancelled && !section.cancelled)
                                || (!section.cancelled && grew(o.limit, section.limit))
                        }
                    };
                    if opened {
                        changed.insert(offering.id);
                    }
                }
            }
        }
    }
    changed.into_iter().collect()
}

fn grew(old: i32, new: i32) -> bool {
    match (old < 0, new < 0) {
        (true, _) => false,
        (false, true) => true,
        (false, false) => new > old,
    }
}
