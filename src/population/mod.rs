pub mod fast_non_dominated_sort;
pub mod front;
pub mod hall_of_fame;
pub mod population;

pub use fast_non_dominated_sort::fast_non_dominated_sort;
pub use front::Front;
pub use hall_of_fame::{HallOfFame, HallOfFameEntry};
pub use population::{OfferOutcome, Population, PopulationConfig, SelectedParent};
