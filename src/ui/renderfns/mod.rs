pub mod header;
pub mod utils;

pub use header::draw_header;
pub use utils::{balance_color, format_money, truncate};
