/// Tunables of the water demo pipeline and its animation clock

use glam::{Vec2, Vec3};

/// Deferred debug view written to the `ShowType` uniform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowType {
    #[default]
    Lighting = 0,
    Albedo = 1,
    Position = 2,
    Depth = 3,
    WorldNormal = 4,
    ViewNormal = 5,
}

impl ShowType {
    pub const ALL: [ShowType; 6] = [
        ShowType::Lighting,
        ShowType::Albedo,
        ShowType::Position,
        ShowType::Depth,
        ShowType::WorldNormal,
        ShowType::ViewNormal,
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        Self::ALL.get(usize::try_from(index).ok()?).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            ShowType::Lighting => "Lighting",
            ShowType::Albedo => "Albedo",
            ShowType::Position => "Position",
            ShowType::Depth => "Depth",
            ShowType::WorldNormal => "WorldNormal",
            ShowType::ViewNormal => "ViewNormal",
        }
    }
}

/// Screen-space reflection ray march parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsrSettings {
    /// Longest reflected ray, in view-space units
    pub max_distance: f32,
    /// Fraction of the `steps` actually marched (0..1]
    pub resolution: f32,
    pub steps: i32,
    /// Depth tolerance for counting a ray sample as a hit
    pub thickness: f32,
}

impl Default for SsrSettings {
    fn default() -> Self {
        Self {
            max_distance: 20.0,
            resolution: 0.7,
            steps: 15,
            thickness: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterPipelineSettings {
    pub ssr: SsrSettings,
    /// Horizontal + vertical blur pairs run per frame
    pub blur_iterations: usize,
    /// Blur pass pairs allocated at build time; `blur_iterations` is clamped to it
    pub max_blur_iterations: usize,
    /// Blur tap spacing in pixels
    pub blur_scale: f32,
    pub show_type: ShowType,
}

impl Default for WaterPipelineSettings {
    fn default() -> Self {
        Self {
            ssr: SsrSettings::default(),
            blur_iterations: 5,
            max_blur_iterations: 8,
            blur_scale: 6.0,
            show_type: ShowType::Lighting,
        }
    }
}

/// Flow-mapped water surface parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterSurfaceSettings {
    /// Tint added to the color texture
    pub color: Vec3,
    /// UV jump per flow phase
    pub jump: Vec2,
    pub tiling: i32,
    pub speed: f32,
    pub flow_strength: f32,
    pub flow_offset: f32,
    /// Opacity used by the forward (blended) path
    pub alpha: f32,
}

impl Default for WaterSurfaceSettings {
    fn default() -> Self {
        Self {
            color: Vec3::ZERO,
            jump: Vec2::ZERO,
            tiling: 3,
            speed: 0.5,
            flow_strength: 0.25,
            flow_offset: 0.0,
            alpha: 0.6,
        }
    }
}

/// Animation time that wraps back to zero after `max_playtime` seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterClock {
    elapsed: f32,
    playing: bool,
    max_playtime: f32,
}

impl WaterClock {
    pub const DEFAULT_MAX_PLAYTIME: f32 = 60.0;

    pub fn new(max_playtime: f32) -> Self {
        Self {
            elapsed: 0.0,
            playing: true,
            max_playtime,
        }
    }

    /// Advance by `delta` seconds if playing; returns the new elapsed time
    pub fn advance(&mut self, delta: f32) -> f32 {
        if self.playing {
            self.elapsed += delta;
        }
        if self.elapsed > self.max_playtime {
            self.elapsed = 0.0;
        }
        self.elapsed
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Scrub to `time`, clamped to [0, max_playtime]
    pub fn set_elapsed(&mut self, time: f32) {
        self.elapsed = time.clamp(0.0, self.max_playtime);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn max_playtime(&self) -> f32 {
        self.max_playtime
    }
}

impl Default for WaterClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_PLAYTIME)
    }
}
