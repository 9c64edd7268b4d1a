//! Control-surface model.
//!
//! The panel drives four binary input lines into the low nibble of the
//! INPUT latch and shows OUTPUT either as a number or as two 3-lamp
//! traffic lights.
//!
//! | INPUT bit | line              |
//! |-----------|-------------------|
//! | 0         | day/night         |
//! | 1         | car on side street|
//! | 2         | sensor G1         |
//! | 3         | sensor G2         |
//!
//! | OUTPUT bit | lamp               |
//! |------------|--------------------|
//! | 0 / 1 / 2  | main red/yellow/green |
//! | 3 / 4 / 5  | side red/yellow/green |

use crate::bits::Word8;
use crate::cpu::IoBus;
use serde::{Serialize, Deserialize};
use std::fmt;

/// The four switch inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLines {
    pub day_night: bool,
    pub side_street_car: bool,
    pub sensor_g1: bool,
    pub sensor_g2: bool,
}

impl InputLines {
    /// Number of switch lines.
    pub const COUNT: usize = 4;

    /// Pack into an INPUT byte; the high nibble is always 0.
    pub fn to_word(self) -> Word8 {
        let value = self.day_night as u8
            | (self.side_street_car as u8) << 1
            | (self.sensor_g1 as u8) << 2
            | (self.sensor_g2 as u8) << 3;
        Word8::new(value)
    }

    /// Unpack from the low nibble of an INPUT byte.
    pub fn from_word(word: Word8) -> Self {
        Self {
            day_night: word.bit(0),
            side_street_car: word.bit(1),
            sensor_g1: word.bit(2),
            sensor_g2: word.bit(3),
        }
    }

    /// Flip the line at `index` (0-3). Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        match index {
            0 => self.day_night = !self.day_night,
            1 => self.side_street_car = !self.side_street_car,
            2 => self.sensor_g1 = !self.sensor_g1,
            3 => self.sensor_g2 = !self.sensor_g2,
            _ => {}
        }
    }

    /// The line at `index` with its label.
    pub fn line(&self, index: usize) -> Option<(&'static str, bool)> {
        match index {
            0 => Some(("Day/Night", self.day_night)),
            1 => Some(("Car on side street", self.side_street_car)),
            2 => Some(("Sensor G1", self.sensor_g1)),
            3 => Some(("Sensor G2", self.sensor_g2)),
            _ => None,
        }
    }

    /// Drive the lines onto a bus.
    pub fn apply(self, bus: &IoBus) {
        bus.set_input(self.to_word());
    }
}

/// How OUTPUT is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// Plain unsigned integer.
    #[default]
    Numeric,
    /// Two red/yellow/green lamp groups.
    TrafficLights,
}

impl DisplayMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Numeric => DisplayMode::TrafficLights,
            DisplayMode::TrafficLights => DisplayMode::Numeric,
        }
    }
}

/// One red/yellow/green lamp group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampGroup {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl LampGroup {
    fn from_bits(word: Word8, base: usize) -> Self {
        Self {
            red: word.bit(base),
            yellow: word.bit(base + 1),
            green: word.bit(base + 2),
        }
    }
}

impl fmt::Display for LampGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lamp = |on: bool, c: char| if on { c } else { '.' };
        write!(f, "[{}{}{}]", lamp(self.red, 'R'), lamp(self.yellow, 'Y'), lamp(self.green, 'G'))
    }
}

/// OUTPUT decoded as two traffic lights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficLights {
    pub main: LampGroup,
    pub side: LampGroup,
}

impl TrafficLights {
    /// Decode bits 0-5 of OUTPUT; bits 6 and 7 are unused.
    pub fn from_output(output: Word8) -> Self {
        Self {
            main: LampGroup::from_bits(output, 0),
            side: LampGroup::from_bits(output, 3),
        }
    }
}

impl fmt::Display for TrafficLights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "main {} side {}", self.main, self.side)
    }
}

/// Render OUTPUT in the given mode.
pub fn render_output(output: Word8, mode: DisplayMode) -> String {
    match mode {
        DisplayMode::Numeric => output.value().to_string(),
        DisplayMode::TrafficLights => TrafficLights::from_output(output).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_packing_order() {
        let lines = InputLines { day_night: true, side_street_car: false, sensor_g1: true, sensor_g2: false };
        assert_eq!(lines.to_word().value(), 0b0000_0101);

        let lines = InputLines { sensor_g2: true, ..Default::default() };
        assert_eq!(lines.to_word().value(), 0b0000_1000);
    }

    #[test]
    fn test_input_from_word_ignores_high_nibble() {
        let lines = InputLines::from_word(Word8::new(0b1111_0010));
        assert_eq!(lines, InputLines { side_street_car: true, ..Default::default() });
        assert_eq!(lines.to_word().value(), 0b0010);
    }

    #[test]
    fn test_toggle() {
        let mut lines = InputLines::default();
        lines.toggle(3);
        lines.toggle(0);
        lines.toggle(9);
        assert_eq!(lines.to_word().value(), 0b1001);
        lines.toggle(0);
        assert_eq!(lines.to_word().value(), 0b1000);
        assert_eq!(lines.line(3), Some(("Sensor G2", true)));
        assert_eq!(lines.line(4), None);
    }

    #[test]
    fn test_apply_to_bus() {
        let bus = IoBus::new();
        InputLines { side_street_car: true, ..Default::default() }.apply(&bus);
        assert_eq!(bus.input().value(), 0b0010);
    }

    #[test]
    fn test_traffic_lights() {
        // main green, side red
        let lights = TrafficLights::from_output(Word8::new(0b0000_1100));
        assert_eq!(lights.main, LampGroup { red: false, yellow: false, green: true });
        assert_eq!(lights.side, LampGroup { red: true, yellow: false, green: false });
        assert_eq!(lights.to_string(), "main [..G] side [R..]");
    }

    #[test]
    fn test_render_output() {
        assert_eq!(render_output(Word8::new(200), DisplayMode::Numeric), "200");
        assert_eq!(
            render_output(Word8::new(0b1100_0001), DisplayMode::TrafficLights),
            "main [R..] side [...]"
        );
        assert_eq!(DisplayMode::Numeric.toggled(), DisplayMode::TrafficLights);
    }
}
