//! Line-oriented event scripts for driving a carousel without a window.
//!
//! One step per line, `#` starts a comment:
//!
//! ```text
//! width 390
//! down 200          # pointer down on the slide surface
//! move 120
//! advance 16        # let a frame pass
//! up
//! end               # the renderer finished the transition
//! page hidden
//! ```

use anyhow::{Context, Result};

use loopdeck::PointerTarget;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Down { x: f32, target: PointerTarget },
    Move { x: f32 },
    Up,
    Cancel,
    /// Let `ms` milliseconds of virtual time pass.
    Advance { ms: u64 },
    /// Report the running transition as finished.
    End,
    Next,
    Prev,
    GoTo { index: usize },
    Pause,
    Resume,
    PageVisible(bool),
    RootInViewport(bool),
    Width(f32),
    Seen { render_index: usize },
    Decoded { render_index: usize },
    Cta { slide: usize, cta: usize },
    Teardown,
}

impl Step {
    fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let step = match (verb, args.as_slice()) {
            ("down", [x]) => Step::Down {
                x: number(x)?,
                target: PointerTarget::Surface,
            },
            ("down", [x, "interactive"]) => Step::Down {
                x: number(x)?,
                target: PointerTarget::Interactive,
            },
            ("move", [x]) => Step::Move { x: number(x)? },
            ("up", []) => Step::Up,
            ("cancel", []) => Step::Cancel,
            ("advance", [ms]) => Step::Advance { ms: integer(ms)? },
            ("end", []) => Step::End,
            ("next", []) => Step::Next,
            ("prev", []) => Step::Prev,
            ("goto", [index]) => Step::GoTo {
                index: integer(index)?,
            },
            ("pause", []) => Step::Pause,
            ("resume", []) => Step::Resume,
            ("page", ["visible"]) => Step::PageVisible(true),
            ("page", ["hidden"]) => Step::PageVisible(false),
            ("root", ["in"]) => Step::RootInViewport(true),
            ("root", ["out"]) => Step::RootInViewport(false),
            ("width", [px]) => Step::Width(number(px)?),
            ("seen", [index]) => Step::Seen {
                render_index: integer(index)?,
            },
            ("decoded", [index]) => Step::Decoded {
                render_index: integer(index)?,
            },
            ("cta", [slide, cta]) => Step::Cta {
                slide: integer(slide)?,
                cta: integer(cta)?,
            },
            ("teardown", []) => Step::Teardown,
            _ => anyhow::bail!("unrecognised step `{line}`"),
        };
        Ok(Some(step))
    }
}

fn number(s: &str) -> Result<f32> {
    s.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| anyhow::anyhow!("expected a number, got `{s}`"))
}

fn integer<T: std::str::FromStr>(s: &str) -> Result<T> {
    s.parse::<T>()
        .map_err(|_| anyhow::anyhow!("expected a whole number, got `{s}`"))
}

/// Parse a whole script, returning each step with its 1-based line number.
pub fn parse(text: &str) -> Result<Vec<(usize, Step)>> {
    let mut steps = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(step) = Step::parse(line).with_context(|| format!("line {}", i + 1))? {
            steps.push((i + 1, step));
        }
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_with_comments() {
        let steps = parse(
            "# warm up\nwidth 390\n\ndown 200 interactive  # on a button\nmove 120.5\nadvance 16\nup\nend\n",
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                (2, Step::Width(390.0)),
                (
                    4,
                    Step::Down {
                        x: 200.0,
                        target: PointerTarget::Interactive
                    }
                ),
                (5, Step::Move { x: 120.5 }),
                (6, Step::Advance { ms: 16 }),
                (7, Step::Up),
                (8, Step::End),
            ]
        );
    }

    #[test]
    fn test_parse_visibility_and_commands() {
        let steps = parse("page hidden\nroot out\ngoto 3\ncta 1 0\nteardown").unwrap();
        let steps: Vec<Step> = steps.into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            steps,
            vec![
                Step::PageVisible(false),
                Step::RootInViewport(false),
                Step::GoTo { index: 3 },
                Step::Cta { slide: 1, cta: 0 },
                Step::Teardown,
            ]
        );
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = parse("next\njump 4\n").unwrap_err();
        assert_eq!(err.to_string(), "line 2");
        assert!(format!("{err:#}").contains("unrecognised step `jump 4`"));

        assert!(parse("advance -5").is_err());
        assert!(parse("move far").is_err());
        assert!(parse("up now").is_err());
    }
}
