// This module contains all the csv-specific code in the project

mod load_mnist;
pub use load_mnist::{load_mnist, read_mnist, RowKind};

mod write_predictions;
pub use write_predictions::{save_predictions, write_predictions};
