//! Event bus integration tests.

mod subscribe;
mod publish;
