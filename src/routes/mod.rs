/// Router Module Index
///
/// Splits the routes by who may call them. Authentication is applied per module as a
/// route layer in `create_router`; role checks go through the access guard inside each
/// handler.

/// Routes open to anonymous clients.
pub mod public;

/// Routes for any authenticated role.
pub mod authenticated;

/// Routes restricted to the `Admin` role.
pub mod admin;
