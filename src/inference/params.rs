//! Parameter validation
//!
//! Saturates generation parameters into the ranges the engine accepts.

use serde::Serialize;

use crate::types::generation::GenerationRequest;

pub const MAX_TOKENS_RANGE: (i64, i64) = (1, 4096);
pub const TEMPERATURE_RANGE: (f32, f32) = (0.1, 2.0);
pub const TOP_P_RANGE: (f32, f32) = (0.1, 1.0);
pub const REPEAT_PENALTY_RANGE: (f32, f32) = (0.1, 2.0);

/// Closed interval advertised to clients
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

/// Every supported parameter range
#[derive(Debug, Clone, Serialize)]
pub struct ParameterRanges {
    pub max_tokens: Range<i64>,
    pub temperature: Range<f32>,
    pub top_p: Range<f32>,
    pub repeat_penalty: Range<f32>,
}

fn range<T>((min, max): (T, T)) -> Range<T> {
    Range { min, max }
}

pub fn parameter_ranges() -> ParameterRanges {
    ParameterRanges {
        max_tokens: range(MAX_TOKENS_RANGE),
        temperature: range(TEMPERATURE_RANGE),
        top_p: range(TOP_P_RANGE),
        repeat_penalty: range(REPEAT_PENALTY_RANGE),
    }
}

/// Normalize a request
///
/// Trims the prompt and clamps every numeric field. Never rejects; an empty
/// prompt is left for the caller to refuse.
pub fn clamp(req: GenerationRequest) -> GenerationRequest {
    GenerationRequest {
        prompt: req.prompt.trim().to_string(),
        max_tokens: req.max_tokens.clamp(MAX_TOKENS_RANGE.0, MAX_TOKENS_RANGE.1),
        temperature: clamp_f32(req.temperature, TEMPERATURE_RANGE),
        top_p: clamp_f32(req.top_p, TOP_P_RANGE),
        repeat_penalty: clamp_f32(req.repeat_penalty, REPEAT_PENALTY_RANGE),
    }
}

// NaN maps to the floor.
fn clamp_f32(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(max_tokens: i64, temperature: f32, top_p: f32, repeat_penalty: f32) -> GenerationRequest {
        GenerationRequest {
            prompt: "  hi  ".to_string(),
            max_tokens,
            temperature,
            top_p,
            repeat_penalty,
        }
    }

    #[test]
    fn test_values_above_ceiling() {
        let clamped = clamp(request(100_000, 5.0, 3.0, 9.0));
        assert_eq!(clamped.max_tokens, 4096);
        assert_eq!(clamped.temperature, 2.0);
        assert_eq!(clamped.top_p, 1.0);
        assert_eq!(clamped.repeat_penalty, 2.0);
    }

    #[test]
    fn test_values_below_floor() {
        let clamped = clamp(request(-3, -1.0, 0.0, f32::NEG_INFINITY));
        assert_eq!(clamped.max_tokens, 1);
        assert_eq!(clamped.temperature, 0.1);
        assert_eq!(clamped.top_p, 0.1);
        assert_eq!(clamped.repeat_penalty, 0.1);
    }

    #[test]
    fn test_in_range_untouched() {
        let clamped = clamp(request(256, 0.7, 0.95, 1.1));
        assert_eq!(
            (clamped.max_tokens, clamped.temperature, clamped.top_p, clamped.repeat_penalty),
            (256, 0.7, 0.95, 1.1)
        );
        assert_eq!(clamped.prompt, "hi");
    }

    #[test]
    fn test_nan_goes_to_floor() {
        let clamped = clamp(request(10, f32::NAN, f32::NAN, f32::NAN));
        assert_eq!(clamped.temperature, 0.1);
        assert_eq!(clamped.top_p, 0.1);
        assert_eq!(clamped.repeat_penalty, 0.1);
    }

    #[test]
    fn test_clamp_is_idempotent() {
        let inputs = [
            request(i64::MIN, f32::MIN, -0.0, f32::NAN),
            request(0, 0.1, 1.0, 2.0),
            request(4097, 2.0001, 1.5, f32::INFINITY),
            request(77, 1.3, 0.42, 0.9),
        ];
        for input in inputs {
            let once = clamp(input);
            assert_eq!(clamp(once.clone()), once);
            assert!((1..=4096).contains(&once.max_tokens));
            assert!((0.1..=2.0).contains(&once.temperature));
            assert!((0.1..=1.0).contains(&once.top_p));
            assert!((0.1..=2.0).contains(&once.repeat_penalty));
        }
    }
}
