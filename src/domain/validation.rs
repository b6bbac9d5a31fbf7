//! Record Validation
//!
//! Shape checks applied to a record assembled from a partial update before it
//! is admitted into the registry. Limits follow the mesh protocol's field sizes.

use thiserror::Error;

use super::node::{NodeIdentity, NodePosition, NodeRecord};

// =============================================================================
// Field Limits
// =============================================================================

/// Maximum identity id length in bytes
pub const MAX_ID_BYTES: usize = 15;

/// Maximum long name length in bytes
pub const MAX_LONG_NAME_BYTES: usize = 39;

/// Maximum short name length in bytes
pub const MAX_SHORT_NAME_BYTES: usize = 4;

/// Required MAC address length when one is present
pub const MACADDR_BYTES: usize = 6;

/// Latitude bound in 1e-7 degree units
pub const MAX_LATITUDE_I: i32 = 900_000_000;

/// Longitude bound in 1e-7 degree units
pub const MAX_LONGITUDE_I: i32 = 1_800_000_000;

// =============================================================================
// Validation Error
// =============================================================================

/// Why a candidate record was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is {actual_bytes} bytes, limit is {max_bytes}")]
    FieldTooLong {
        field: &'static str,
        max_bytes: usize,
        actual_bytes: usize,
    },

    #[error("macaddr must be empty or {} bytes, got {actual_bytes}", MACADDR_BYTES)]
    BadMacAddress { actual_bytes: usize },

    #[error("latitude {latitude_i} outside ±{}", MAX_LATITUDE_I)]
    LatitudeOutOfRange { latitude_i: i32 },

    #[error("longitude {longitude_i} outside ±{}", MAX_LONGITUDE_I)]
    LongitudeOutOfRange { longitude_i: i32 },

    #[error("malformed node number: {input:?}")]
    MalformedNodeNum { input: String },
}

// =============================================================================
// Validators
// =============================================================================

fn check_len(field: &'static str, value: &str, max_bytes: usize) -> Result<(), ValidationError> {
    if value.len() > max_bytes {
        return Err(ValidationError::FieldTooLong {
            field,
            max_bytes,
            actual_bytes: value.len(),
        });
    }
    Ok(())
}

/// Validate identity field sizes
pub fn validate_identity(identity: &NodeIdentity) -> Result<(), ValidationError> {
    check_len("id", &identity.id, MAX_ID_BYTES)?;
    check_len("long_name", &identity.long_name, MAX_LONG_NAME_BYTES)?;
    check_len("short_name", &identity.short_name, MAX_SHORT_NAME_BYTES)?;

    let mac_len = identity.macaddr.len();
    if mac_len != 0 && mac_len != MACADDR_BYTES {
        return Err(ValidationError::BadMacAddress {
            actual_bytes: mac_len,
        });
    }
    Ok(())
}

/// Validate coordinate ranges
pub fn validate_position(position: &NodePosition) -> Result<(), ValidationError> {
    if let Some(latitude_i) = position.latitude_i {
        if !(-MAX_LATITUDE_I..=MAX_LATITUDE_I).contains(&latitude_i) {
            return Err(ValidationError::LatitudeOutOfRange { latitude_i });
        }
    }
    if let Some(longitude_i) = position.longitude_i {
        if !(-MAX_LONGITUDE_I..=MAX_LONGITUDE_I).contains(&longitude_i) {
            return Err(ValidationError::LongitudeOutOfRange { longitude_i });
        }
    }
    Ok(())
}

/// Validate every populated part of a record
pub fn validate_record(record: &NodeRecord) -> Result<(), ValidationError> {
    if let Some(identity) = &record.identity {
        validate_identity(identity)?;
    }
    if let Some(position) = &record.position {
        validate_position(position)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payloads_are_valid() {
        assert!(validate_identity(&NodeIdentity::default()).is_ok());
        assert!(validate_position(&NodePosition::default()).is_ok());
        assert!(validate_record(&NodeRecord::new(1u32)).is_ok());
    }

    #[test]
    fn test_short_name_limit() {
        let identity = NodeIdentity {
            short_name: "TOOLONG".to_string(),
            ..Default::default()
        };
        assert_eq!(
            validate_identity(&identity),
            Err(ValidationError::FieldTooLong {
                field: "short_name",
                max_bytes: MAX_SHORT_NAME_BYTES,
                actual_bytes: 7,
            })
        );
    }

    #[test]
    fn test_long_name_counts_bytes_not_chars() {
        // 20 two-byte characters
        let identity = NodeIdentity {
            long_name: "é".repeat(20),
            ..Default::default()
        };
        assert!(matches!(
            validate_identity(&identity),
            Err(ValidationError::FieldTooLong { field: "long_name", actual_bytes: 40, .. })
        ));
    }

    #[test]
    fn test_macaddr_length() {
        let mut identity = NodeIdentity::with_id("!abc123");
        identity.macaddr = vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
        assert!(validate_identity(&identity).is_ok());

        identity.macaddr.truncate(3);
        assert_eq!(
            validate_identity(&identity),
            Err(ValidationError::BadMacAddress { actual_bytes: 3 })
        );
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(validate_position(&NodePosition::from_degrees(90.0, 180.0)).is_ok());
        assert!(validate_position(&NodePosition::from_degrees(-90.0, -180.0)).is_ok());

        let north = NodePosition {
            latitude_i: Some(MAX_LATITUDE_I + 1),
            ..Default::default()
        };
        assert_eq!(
            validate_position(&north),
            Err(ValidationError::LatitudeOutOfRange { latitude_i: MAX_LATITUDE_I + 1 })
        );

        let east = NodePosition {
            longitude_i: Some(i32::MAX),
            ..Default::default()
        };
        assert!(matches!(
            validate_position(&east),
            Err(ValidationError::LongitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_record_checks_both_parts() {
        let record = NodeRecord::new(9u32)
            .with_identity(NodeIdentity::with_id("!00000009"))
            .with_position(NodePosition {
                latitude_i: Some(-MAX_LATITUDE_I - 5),
                ..Default::default()
            });
        assert!(matches!(
            validate_record(&record),
            Err(ValidationError::LatitudeOutOfRange { .. })
        ));
    }
}
