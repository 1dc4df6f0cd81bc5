use crate::domain::model::{Entity, EntityBundle};

pub const DATE_LABEL: &str = "DATE";

/// Split recognizer output into dates (text only) and everything else.
/// Order is preserved and nothing is deduplicated or normalized.
pub fn bucket_entities(entities: impl IntoIterator<Item = Entity>) -> EntityBundle {
    let mut bundle = EntityBundle::default();
    for entity in entities {
        if entity.label == DATE_LABEL {
            bundle.dates.push(entity.text);
        } else {
            bundle.other.push((entity.text, entity.label));
        }
    }
    bundle
}
