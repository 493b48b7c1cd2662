// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive picker.
//
// Module responsibilities:
// - `key`: loads and validates the provider API key.
// - `api`: blocking HTTP client for geolocation and place search, plus the
//   typed records decoded from their responses.
// - `selector`: the accept/reject loop over paged, shuffled results.
// - `ui`: console formatting and yes/no prompters.
// - `error`: the error kinds shared by all of the above.
pub mod api;
pub mod error;
pub mod key;
pub mod selector;
pub mod ui;

pub use error::{PickerError, Result};
