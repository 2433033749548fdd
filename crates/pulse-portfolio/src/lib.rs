//! Position valuation and change highlighting for the pulse dashboard.
//!
//! Pure derivations over two inputs the rest of the system produces: the
//! price book from `pulse-feed` and position/funds snapshots from the REST
//! collaborator. Valuation is stateless; highlighting keeps only the last
//! observed value per cell.

pub mod highlight;
pub mod source;
pub mod valuation;

pub use highlight::{FlashColor, FlashTracker, FLASH_DURATION};
pub use source::{PortfolioSource, SnapshotPortfolio};
pub use valuation::{PortfolioSummary, PositionMetrics};
