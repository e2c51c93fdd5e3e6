use super::ifd::ExifContainer;
use crate::error::{CleanError, Result};
use crate::policy::DecisionSet;
use crate::taxonomy::{self, FieldKey};

/// What a strip pass did to a container.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StripReport {
    /// Display names of cleared fields, catalogued fields first in catalog
    /// order, then uncatalogued ones in container order.
    pub removed: Vec<String>,
    /// Fields the container refused to clear.
    pub skipped: Vec<String>,
}

/// Clear every field the decision set selects.
///
/// `after_clear` runs after each successful clear with the field's display
/// name; an error from it aborts the pass. Fields the container refuses to
/// clear are logged and skipped.
pub fn strip_fields(
    container: &mut ExifContainer,
    decisions: &DecisionSet,
    after_clear: &mut dyn FnMut(&str) -> Result<()>,
) -> Result<StripReport> {
    let mut report = StripReport::default();

    let catalogued = decisions.strip_set().into_iter().map(|d| d.key);
    // Uncatalogued fields follow their directory's category.
    let uncatalogued: Vec<FieldKey> = container
        .keys()
        .into_iter()
        .filter(|k| taxonomy::lookup(*k).is_none())
        .filter(|k| decisions.removes(taxonomy::category_of(*k)))
        .collect();

    for key in catalogued.chain(uncatalogued) {
        let name = taxonomy::display_name(key);
        match container.clear(key) {
            Ok(true) => {
                log::debug!("Cleared {name}");
                after_clear(&name)?;
                report.removed.push(name.into_owned());
            }
            Ok(false) => {}
            Err(CleanError::PartialTagFailure { tag, reason }) => {
                log::warn!("Skipping {tag}: {reason}");
                report.skipped.push(tag);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
