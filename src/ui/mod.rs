pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, section, status, success, summary_row, trace, warn};
pub use table::{TableBuilder, knowledge_table, matches_table, stats_table, symbols_table};
pub use theme::{Theme, theme};
