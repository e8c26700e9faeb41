use crate::error::ApiError;

/// Ownership gate used by every update/delete path. Absence is checked
/// first: a missing entity is `NotFound` no matter who asks.
pub fn assert_owner<T>(
    entity: Option<T>,
    owner_of: impl Fn(&T) -> &str,
    acting: &str,
    what: &'static str,
) -> Result<T, ApiError> {
    let entity = entity.ok_or(ApiError::NotFound(what))?;
    if owner_of(&entity) != acting {
        return Err(ApiError::Forbidden(format!(
            "You do not own this {what}"
        )));
    }
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Thing {
        owner: String,
    }

    #[test]
    fn missing_entity_is_not_found_even_for_strangers() {
        let err = assert_owner(None::<Thing>, |t| &t.owner, "someone", "video").unwrap_err();
        assert!(matches!(err, ApiError::NotFound("video")));
    }

    #[test]
    fn wrong_owner_is_forbidden() {
        let thing = Thing {
            owner: "alice".into(),
        };
        let err = assert_owner(Some(thing), |t| &t.owner, "bob", "tweet").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn owner_passes_and_gets_the_entity_back() {
        let thing = Thing {
            owner: "alice".into(),
        };
        let thing = assert_owner(Some(thing), |t| &t.owner, "alice", "playlist").unwrap();
        assert_eq!(thing.owner, "alice");
    }
}
