use std::{fs::File, io::{BufReader, BufWriter, Read, Write}, path::Path, time::SystemTime};

use chrono::DateTime;
use gpx::{Gpx, GpxVersion, Time, Track, TrackSegment, Waypoint};
use time::OffsetDateTime;
use workout_tracker_lib::{geo_point::TimestampedGeoPoint, workout::WorkoutRecord};

use crate::{DataManager, DataManagerError};

impl DataManager {
    /// Writes a saved workout's route to a GPX file.
    pub async fn export_gpx(&self, index: usize, path: impl AsRef<Path>) -> Result<(), DataManagerError> {
        let record = self.get_workout(index).await?;

        let file = File::create(path.as_ref())
            .map_err(|err| DataManagerError::Gpx(format!("Failed to create {:?}: {}", path.as_ref(), err)))?;
        write_gpx(&record, BufWriter::new(file))?;

        tracing::info!("Exported workout {} to {:?}", index, path.as_ref());
        Ok(())
    }
}

/// All timed track points of a GPX file, in file order. Points without a time are skipped.
pub fn read_gpx_samples(path: impl AsRef<Path>) -> Result<Vec<TimestampedGeoPoint>, DataManagerError> {
    let file = File::open(path.as_ref())
        .map_err(|err| DataManagerError::Gpx(format!("Failed to open {:?}: {}", path.as_ref(), err)))?;
    parse_gpx_samples(BufReader::new(file))
}

pub fn parse_gpx_samples(reader: impl Read) -> Result<Vec<TimestampedGeoPoint>, DataManagerError> {
    let gpx = gpx::read(reader).map_err(|err| DataManagerError::Gpx(format!("Failed to parse GPX: {}", err)))?;

    let mut samples = Vec::new();
    let mut untimed = 0;
    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                let Some(time) = point.time else {
                    untimed += 1;
                    continue;
                };

                let time = time.format().map_err(|err| DataManagerError::Gpx(format!("Bad point time: {}", err)))?;
                let timestamp = DateTime::parse_from_rfc3339(&time)
                    .map_err(|err| DataManagerError::Gpx(format!("Bad point time {}: {}", time, err)))?;

                let position = point.point();
                samples.push(TimestampedGeoPoint::new(position.y(), position.x(), timestamp.timestamp_millis()));
            }
        }
    }

    if untimed > 0 {
        tracing::warn!("Skipped {} GPX points without a timestamp", untimed);
    }

    Ok(samples)
}

/// A GPX 1.1 document with the route as a single track.
pub fn write_gpx(record: &WorkoutRecord, writer: impl Write) -> Result<(), DataManagerError> {
    let mut gpx = Gpx::default();
    gpx.version = GpxVersion::Gpx11;
    gpx.creator = Some("workout_tracker".into());

    let name = format!("Workout {}", record.timestamp_iso);
    let time = DateTime::parse_from_rfc3339(&record.timestamp_iso).ok().map(|finished| {
        let finished: SystemTime = finished.into();
        let finished: OffsetDateTime = finished.into();
        Time::from(finished)
    });
    gpx.metadata = Some(gpx::Metadata {
        name: Some(name.clone()),
        time,
        ..Default::default()
    });

    let mut track = Track::new();
    track.name = Some(name);
    let mut segment = TrackSegment::new();
    segment.points.extend(record.route.iter().map(|point| Waypoint::new(geo_types::Point::from(*point))));
    track.segments.push(segment);
    gpx.tracks.push(track);

    gpx::write(&gpx, writer).map_err(|err| DataManagerError::Gpx(format!("Failed to write GPX: {}", err)))
}
