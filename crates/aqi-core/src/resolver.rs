//! First-valid record selection over an upstream response

use crate::calculator::{calculate_aqi, categorize};
use crate::error::{AqiError, NotFoundReason};
use crate::types::{AqiResult, CandidateRecord, UpstreamReply, UNKNOWN_PLACE};

/// A record that passed validation, with its concentration parsed
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReading<'a> {
    /// Position in the upstream list
    pub index: usize,
    pub concentration: f64,
    pub last_update: &'a str,
    pub record: &'a CandidateRecord,
}

impl CandidateRecord {
    /// A record is usable when its concentration is numeric (not "NA")
    /// and it carries a non-blank timestamp.
    pub fn reading(&self) -> Option<(f64, &str)> {
        let concentration = self.avg_value.as_ref()?.as_reading()?;
        let last_update = self.last_update.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((concentration, last_update))
    }
}

/// Pick the first usable record, in upstream order
pub fn select_record(records: &[CandidateRecord]) -> Option<ValidReading<'_>> {
    records.iter().enumerate().find_map(|(index, record)| {
        record
            .reading()
            .map(|(concentration, last_update)| ValidReading {
                index,
                concentration,
                last_update,
                record,
            })
    })
}

/// Turn an upstream reply into an AQI result or a typed failure
pub fn resolve(reply: UpstreamReply) -> Result<AqiResult, AqiError> {
    let payload = match reply {
        UpstreamReply::Payload(payload) => payload,
        UpstreamReply::HttpStatus { status, body } => {
            return Err(AqiError::UpstreamStatus { status, body })
        }
        UpstreamReply::Unreachable { detail } => {
            return Err(AqiError::UpstreamUnreachable { detail })
        }
    };

    if payload.records.is_empty() {
        return Err(AqiError::NotFound(NotFoundReason::NoRecords));
    }

    let selected = select_record(&payload.records)
        .ok_or(AqiError::NotFound(NotFoundReason::AllInvalid))?;

    let aqi = calculate_aqi(selected.concentration);
    let place = |field: &Option<String>| field.clone().unwrap_or_else(|| UNKNOWN_PLACE.to_string());

    Ok(AqiResult {
        aqi,
        city: place(&selected.record.city),
        state: place(&selected.record.state),
        category: categorize(aqi),
        raw_pm25: selected.concentration,
        last_updated: selected.last_update.to_string(),
    })
}
