use uuid::Uuid;

/// Opaque id of a registered user. Identity and verification live in the
/// identity collaborator; the engine never inspects this value.
pub type UserId = Uuid;

/// Opaque id of a property listing. Listing CRUD lives outside the engine.
pub type PropertyId = Uuid;
