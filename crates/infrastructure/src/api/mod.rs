//! Backend API clients.

mod graphql;

pub use graphql::GraphQlTokenExchange;
