use chrono::NaiveDateTime;

use crate::error::GnssError;

/// Latest position solution.
#[derive(Debug, Clone, PartialEq)]
pub struct GnssFix {
    /// True when the solution is valid.
    pub fixed: bool,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub speed: f64,
    pub heading: f64,
    /// UTC time of the solution.
    pub datetime: NaiveDateTime,
}

impl GnssFix {
    /// A fix that carries no position.
    pub fn none() -> Self {
        Self {
            fixed: false,
            longitude: 0.0,
            latitude: 0.0,
            altitude: 0.0,
            speed: 0.0,
            heading: 0.0,
            datetime: NaiveDateTime::default(),
        }
    }

    /// `A|V,lon,lat,alt,speed,heading,YYYY-MM-DDTHH:MM:SSZ`.
    pub fn render(&self) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
            if self.fixed { 'A' } else { 'V' },
            self.longitude,
            self.latitude,
            self.altitude,
            self.speed,
            self.heading,
            self.datetime.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

/// Receiver status flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GnssStatus {
    pub fix_valid: bool,
    pub leap_second_valid: bool,
    pub sleep_between_pvt: bool,
    pub deadline_missed: bool,
    pub insufficient_time_window: bool,
}

impl GnssStatus {
    /// One `Name: true|false` line per flag.
    pub fn render(&self) -> String {
        let flags = [
            ("Fix valid", self.fix_valid),
            ("Leap second valid", self.leap_second_valid),
            ("Sleep between PVT", self.sleep_between_pvt),
            ("Deadline missed", self.deadline_missed),
            ("Insuf. time window", self.insufficient_time_window),
        ];
        flags
            .iter()
            .map(|(name, value)| format!("{name}: {value}\r\n"))
            .collect()
    }
}

/// Satellite positioning receiver.
pub trait GnssReceiver {
    fn start(&mut self) -> Result<(), GnssError>;

    fn stop(&mut self) -> Result<(), GnssError>;

    fn status(&mut self) -> GnssStatus;

    fn location(&mut self) -> GnssFix;

    /// Most recent NMEA sentences, concatenated.
    fn nmea(&mut self) -> String;
}

/// Stand-in for hosts without a positioning receiver.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGnss;

impl GnssReceiver for NoGnss {
    fn start(&mut self) -> Result<(), GnssError> {
        Err(GnssError::Unavailable)
    }

    fn stop(&mut self) -> Result<(), GnssError> {
        Err(GnssError::Unavailable)
    }

    fn status(&mut self) -> GnssStatus {
        GnssStatus::default()
    }

    fn location(&mut self) -> GnssFix {
        GnssFix::none()
    }

    fn nmea(&mut self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn fix_rendering() {
        let fix = GnssFix {
            fixed: true,
            longitude: 139.5,
            latitude: -35.25,
            altitude: 40.5,
            speed: 0.25,
            heading: 180.0,
            datetime: NaiveDate::from_ymd_opt(2021, 6, 1)
                .and_then(|d| d.and_hms_opt(12, 34, 56))
                .unwrap(),
        };
        assert_eq!(
            fix.render(),
            "A,139.500000,-35.250000,40.500000,0.250000,180.000000,2021-06-01T12:34:56Z"
        );
    }

    #[test]
    fn missing_fix_is_void() {
        assert!(GnssFix::none().render().starts_with("V,0.000000,0.000000,"));
        assert!(GnssFix::none().render().ends_with("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn status_lines() {
        let status = GnssStatus {
            fix_valid: true,
            ..Default::default()
        };
        let text = status.render();
        assert!(text.starts_with("Fix valid: true\r\nLeap second valid: false\r\n"));
        assert_eq!(text.lines().count(), 5);
    }
}
