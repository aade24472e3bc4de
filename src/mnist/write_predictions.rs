use std::io;
use std::path::Path;

use crate::classify::Prediction;
use crate::error::Result;

// Write predictions in the submission layout:
// - Header `ImageId,Label`
// - One `<id + 1>,<label>` row per prediction, in the given order
pub fn write_predictions(sink: impl io::Write, predictions: &[Prediction]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(["ImageId", "Label"])?;
    for prediction in predictions {
        writer.write_record([
            prediction.image_id().to_string(),
            prediction.label.to_string(),
        ])?;
    }
    // Flush errors lose data, so they are reported. Closing happens on drop.
    writer.flush()?;
    Ok(())
}

pub fn save_predictions(path: impl AsRef<Path>, predictions: &[Prediction]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_predictions(io::BufWriter::new(file), predictions)
}
