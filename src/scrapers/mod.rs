//! Fetching and parsing of tender notice boards.
//!
//! Every site goes through the same stages:
//!
//! 1. **Fetch**: one GET with the configured timeout ([`engine`])
//! 2. **Extract**: container and field selectors produce candidates ([`extract`])
//! 3. **Normalize**: dates are rewritten as `dd/mm/yy` when recognizable ([`dates`])
//! 4. **Filter**: keyword score and age window decide what is kept ([`relevance`])
//!
//! | Failure | Scope | Outcome |
//! |---------|-------|---------|
//! | Connection, timeout, HTTP status | site | empty list for that site |
//! | Invalid selector | site | empty list for that site |
//! | Unresolvable link | container | container skipped |
//! | Unrecognized date | field | raw text kept |

pub mod dates;
pub mod engine;
pub mod extract;
pub mod relevance;
