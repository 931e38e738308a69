use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a call-to-action link should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtaKind {
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cta {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CtaKind>,
}

/// Immutable slide content as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: u64,
    #[serde(default)]
    pub desktop_img: String,
    #[serde(default)]
    pub mobile_img: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ctas: Vec<Cta>,
}

impl Slide {
    /// Pick the media reference for a layout `width` pixels wide.
    pub fn media_for(&self, width: f32, wide_breakpoint: f32) -> &str {
        if width >= wide_breakpoint || self.mobile_img.is_empty() {
            &self.desktop_img
        } else {
            &self.mobile_img
        }
    }
}

/// Mutable per-slide flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideRuntimeState {
    /// Eligible to render pixels.
    pub visible: bool,
    /// Media fetch has completed.
    pub loaded: bool,
}

impl SlideRuntimeState {
    fn merged(self, original: SlideRuntimeState) -> Self {
        Self {
            visible: self.visible || original.visible,
            loaded: self.loaded || original.loaded,
        }
    }
}

/// One entry of the clone-extended render sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSlide<'a> {
    pub slide: &'a Slide,
    /// Index of the real slide this entry shows.
    pub real_index: usize,
    pub state: SlideRuntimeState,
    pub is_clone: bool,
}

/// Ordered slides plus their runtime flags.
///
/// Render indices address the clone-extended sequence: `0` is the clone of the
/// last slide, `1..=N` are the real slides and `N + 1` is the clone of the first.
#[derive(Debug, Default)]
pub struct SlideCollection {
    slides: Vec<Slide>,
    runtime: Vec<SlideRuntimeState>,
    /// Clone of the last slide, prepended.
    lead_clone: SlideRuntimeState,
    /// Clone of the first slide, appended.
    trail_clone: SlideRuntimeState,
}

impl SlideCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn runtime(&self, index: usize) -> Option<SlideRuntimeState> {
        self.runtime.get(index).copied()
    }

    /// Replace the whole collection and return the initial slide index.
    ///
    /// Every flag starts cleared except the initial slide's `visible`, so the
    /// first paint never waits on lazy loading. With `random_start` and more
    /// than one slide the initial index is drawn uniformly.
    pub fn load(&mut self, slides: Vec<Slide>, random_start: bool) -> usize {
        let start = if random_start && slides.len() > 1 {
            rand::rng().random_range(0..slides.len())
        } else {
            0
        };
        self.load_at(slides, start)
    }

    /// Like [`load`](Self::load) with an explicit initial index (clamped).
    pub fn load_at(&mut self, slides: Vec<Slide>, start: usize) -> usize {
        let n = slides.len();
        self.slides = slides;
        self.runtime = vec![SlideRuntimeState::default(); n];
        self.lead_clone = SlideRuntimeState::default();
        self.trail_clone = SlideRuntimeState::default();

        if n == 0 {
            return 0;
        }
        let start = start.min(n - 1);
        self.runtime[start].visible = true;
        start
    }

    pub fn clear(&mut self) {
        self.load_at(Vec::new(), 0);
    }

    pub fn render_len(&self) -> usize {
        match self.slides.len() {
            0 => 0,
            n => n + 2,
        }
    }

    /// Map a render index to the real slide index it shows.
    pub fn real_index_of(&self, render_index: usize) -> Option<usize> {
        let n = self.slides.len();
        if n == 0 || render_index >= n + 2 {
            return None;
        }
        Some(match render_index {
            0 => n - 1,
            r if r == n + 1 => 0,
            r => r - 1,
        })
    }

    /// The clone-extended sequence: `[last', s0, .., sN-1, first']`.
    ///
    /// Clone flags mirror their original's but marking a clone never marks the
    /// original.
    pub fn render_sequence(&self) -> Vec<RenderSlide<'_>> {
        let n = self.slides.len();
        if n == 0 {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(n + 2);
        out.push(RenderSlide {
            slide: &self.slides[n - 1],
            real_index: n - 1,
            state: self.lead_clone.merged(self.runtime[n - 1]),
            is_clone: true,
        });
        out.extend(
            self.slides
                .iter()
                .zip(&self.runtime)
                .enumerate()
                .map(|(i, (slide, state))| RenderSlide {
                    slide,
                    real_index: i,
                    state: *state,
                    is_clone: false,
                }),
        );
        out.push(RenderSlide {
            slide: &self.slides[0],
            real_index: 0,
            state: self.trail_clone.merged(self.runtime[0]),
            is_clone: true,
        });
        out
    }

    fn cell_mut(&mut self, render_index: usize) -> Option<&mut SlideRuntimeState> {
        let n = self.slides.len();
        if n == 0 {
            return None;
        }
        match render_index {
            0 => Some(&mut self.lead_clone),
            r if r == n + 1 => Some(&mut self.trail_clone),
            r if r <= n => self.runtime.get_mut(r - 1),
            _ => None,
        }
    }

    /// Set `visible` on a render entry. Returns whether anything changed;
    /// out-of-range indices are ignored.
    pub fn mark_visible(&mut self, render_index: usize) -> bool {
        match self.cell_mut(render_index) {
            Some(cell) if !cell.visible => {
                cell.visible = true;
                true
            }
            _ => false,
        }
    }

    /// Set `loaded` on a render entry. Returns whether anything changed.
    pub fn mark_loaded(&mut self, render_index: usize) -> bool {
        match self.cell_mut(render_index) {
            Some(cell) if !cell.loaded => {
                cell.loaded = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(n: usize) -> Vec<Slide> {
    (0..n)
        .map(|i| Slide {
            id: i as u64 + 1,
            desktop_img: format!("desktop-{i}.jpg"),
            mobile_img: format!("mobile-{i}.jpg"),
            title: format!("Slide {i}"),
            text: String::new(),
            title_img_url: None,
            ctas: Vec::new(),
        })
        .collect()
}
