use crate::{Error, Result};
use core::fmt;

/// A floor number. Floors are 1-based: the lobby is floor `1` and the top
/// floor is `num_floors`.
pub type FloorIndex = u32;

/// Stable identifier of a car, assigned at construction (1-based).
pub type CarId = usize;

/// One passenger's trip: picked up at `origin`, dropped off at
/// `destination`.
///
/// A `CallRequest` can only be built through [`CallRequest::new`], which
/// enforces `origin != destination` and that both floors lie within
/// `[1, num_floors]`. Downstream components rely on this and never revalidate.
///
/// # Example
///
/// ```
/// use liftbank::CallRequest;
///
/// let call = CallRequest::new(1, 10, 10).unwrap();
/// assert_eq!(call.origin(), 1);
/// assert_eq!(call.destination(), 10);
///
/// assert!(CallRequest::new(3, 3, 10).is_err());
/// assert!(CallRequest::new(0, 4, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CallRequest {
    origin: FloorIndex,
    destination: FloorIndex,
}

impl CallRequest {
    /// Validates and creates a call for a building with `num_floors` floors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the floors are equal or either one
    /// is outside `[1, num_floors]`.
    pub fn new(origin: FloorIndex, destination: FloorIndex, num_floors: FloorIndex) -> Result<Self> {
        for (label, floor) in [("origin", origin), ("destination", destination)] {
            if !(1..=num_floors).contains(&floor) {
                return Err(Error::InvalidRequest {
                    reason: format!("{label} floor {floor} is outside 1..={num_floors}"),
                });
            }
        }

        if origin == destination {
            return Err(Error::InvalidRequest {
                reason: format!("origin and destination are both floor {origin}"),
            });
        }

        Ok(Self {
            origin,
            destination,
        })
    }

    /// For callers that derive both floors from `[1, num_floors]` and have
    /// already excluded `origin == destination`.
    pub(crate) const fn new_unchecked(origin: FloorIndex, destination: FloorIndex) -> Self {
        debug_assert!(origin != destination);
        Self {
            origin,
            destination,
        }
    }

    /// Floor where the passenger is waiting.
    pub const fn origin(&self) -> FloorIndex {
        self.origin
    }

    /// Floor where the passenger wants to go.
    pub const fn destination(&self) -> FloorIndex {
        self.destination
    }

    /// Number of floors between `floor` and this call's pickup.
    pub const fn pickup_distance(&self, floor: FloorIndex) -> FloorIndex {
        self.origin.abs_diff(floor)
    }
}

impl fmt::Display for CallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from {} to {}", self.origin, self.destination)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CallRequest {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Raw {
            origin: FloorIndex,
            destination: FloorIndex,
        }

        // Without a floor count only the floor-1 lower bound and the
        // distinct-floors rule can be checked here.
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.origin, raw.destination, FloorIndex::MAX).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_same_floor() {
        let err = CallRequest::new(4, 4, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
    }

    #[test]
    fn rejects_floors_outside_building() {
        assert!(CallRequest::new(0, 5, 10).is_err());
        assert!(CallRequest::new(5, 11, 10).is_err());
        assert!(CallRequest::new(1, 10, 10).is_ok());
        assert!(CallRequest::new(10, 1, 10).is_ok());
    }

    #[test]
    fn pickup_distance_is_symmetric() {
        let call = CallRequest::new(6, 1, 10).unwrap();
        assert_eq!(call.pickup_distance(5), 1);
        assert_eq!(call.pickup_distance(9), 3);
        assert_eq!(call.pickup_distance(6), 0);
    }

    #[test]
    fn displays_as_trip() {
        let call = CallRequest::new(2, 7, 10).unwrap();
        assert_eq!(call.to_string(), "from 2 to 7");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip_keeps_validation() {
        let call = CallRequest::new(3, 8, 10).unwrap();
        let json = serde_json::to_string(&call).unwrap();
        assert_eq!(json, r#"{"origin":3,"destination":8}"#);
        let back: CallRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, call);

        assert!(serde_json::from_str::<CallRequest>(r#"{"origin":3,"destination":3}"#).is_err());
        assert!(serde_json::from_str::<CallRequest>(r#"{"origin":0,"destination":3}"#).is_err());
    }
}
