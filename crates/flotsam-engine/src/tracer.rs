//! Tracers: a shared base state plus a closed set of physical variants.

use std::fmt;

use flotsam_core::{Point, SourceId, TracerId};

// ── Status ────────────────────────────────────────────────────────

/// Lifecycle stage of a tracer.
///
/// `Spawned -> Active -> Inactive`, with `Exited` reachable from any
/// stage. Destroyed tracers are simply no longer in any container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TracerStatus {
    /// Created by emission this step, not yet integrated.
    Spawned,
    /// Moving with the flow.
    Active,
    /// Beached or otherwise stopped. Aged but not moved.
    Inactive,
    /// Left the domain. Reclaimed at the end of the step.
    Exited,
}

impl TracerStatus {
    /// Stable one-byte tag for checkpoints and hashing.
    pub fn tag(self) -> u8 {
        match self {
            Self::Spawned => 0,
            Self::Active => 1,
            Self::Inactive => 2,
            Self::Exited => 3,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Spawned),
            1 => Some(Self::Active),
            2 => Some(Self::Inactive),
            3 => Some(Self::Exited),
            _ => None,
        }
    }
}

impl fmt::Display for TracerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Spawned => "spawned",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Exited => "exited",
        };
        f.write_str(s)
    }
}

// ── Variants ──────────────────────────────────────────────────────

/// Parameters of a paper tracer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaperParams {
    /// Whether the tracer represents particulate matter rather than a
    /// single object.
    pub particulate: bool,
    /// Density in kg/m³.
    pub density: f64,
    /// Equivalent radius in metres.
    pub radius: f64,
    /// Fractional mass loss per unit time.
    pub degradation_rate: f64,
}

/// Polymer family of a plastic tracer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Polymer {
    /// Polyethylene.
    Polyethylene,
    /// Polypropylene.
    Polypropylene,
    /// Polystyrene.
    Polystyrene,
    /// Polyethylene terephthalate.
    Pet,
    /// Polyvinyl chloride.
    Pvc,
    /// Anything else.
    Other,
}

impl Polymer {
    /// Stable one-byte tag.
    pub fn tag(self) -> u8 {
        match self {
            Self::Polyethylene => 0,
            Self::Polypropylene => 1,
            Self::Polystyrene => 2,
            Self::Pet => 3,
            Self::Pvc => 4,
            Self::Other => 5,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Polyethylene),
            1 => Some(Self::Polypropylene),
            2 => Some(Self::Polystyrene),
            3 => Some(Self::Pet),
            4 => Some(Self::Pvc),
            5 => Some(Self::Other),
            _ => None,
        }
    }
}

/// Parameters of a plastic tracer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlasticParams {
    /// Whether the tracer represents particulate matter.
    pub particulate: bool,
    /// Density in kg/m³.
    pub density: f64,
    /// Equivalent radius in metres.
    pub radius: f64,
    /// Fractional mass loss per unit time.
    pub degradation_rate: f64,
    /// Polymer family.
    pub polymer: Polymer,
}

/// Discriminant of [`TracerVariant`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// [`TracerVariant::Generic`].
    Generic,
    /// [`TracerVariant::Paper`].
    Paper,
    /// [`TracerVariant::Plastic`].
    Plastic,
}

impl VariantKind {
    /// Stable one-byte tag.
    pub fn tag(self) -> u8 {
        match self {
            Self::Generic => 0,
            Self::Paper => 1,
            Self::Plastic => 2,
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Generic => "generic",
            Self::Paper => "paper",
            Self::Plastic => "plastic",
        };
        f.write_str(s)
    }
}

/// Physical specialisation of a tracer, fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum TracerVariant {
    /// A passive tracer with no physical properties.
    #[default]
    Generic,
    /// Paper litter.
    Paper(PaperParams),
    /// Plastic litter.
    Plastic(PlasticParams),
}

/// The properties an integrator may use to specialise motion per variant.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct IntegrationHint {
    /// Which variant produced the hint.
    pub kind: Option<VariantKind>,
    /// Density in kg/m³, if the variant has one.
    pub density: Option<f64>,
    /// Equivalent radius in metres, if the variant has one.
    pub radius: Option<f64>,
    /// Whether the tracer is particulate.
    pub particulate: bool,
    /// Fractional mass loss per unit time.
    pub degradation_rate: f64,
}

impl TracerVariant {
    /// Which variant this is.
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::Generic => VariantKind::Generic,
            Self::Paper(_) => VariantKind::Paper,
            Self::Plastic(_) => VariantKind::Plastic,
        }
    }

    /// Properties handed to the integrator.
    pub fn integration_hint(&self) -> IntegrationHint {
        match *self {
            Self::Generic => IntegrationHint {
                kind: Some(VariantKind::Generic),
                ..IntegrationHint::default()
            },
            Self::Paper(p) => IntegrationHint {
                kind: Some(VariantKind::Paper),
                density: Some(p.density),
                radius: Some(p.radius),
                particulate: p.particulate,
                degradation_rate: p.degradation_rate,
            },
            Self::Plastic(p) => IntegrationHint {
                kind: Some(VariantKind::Plastic),
                density: Some(p.density),
                radius: Some(p.radius),
                particulate: p.particulate,
                degradation_rate: p.degradation_rate,
            },
        }
    }

    /// Check that physical parameters are finite and in range.
    pub fn validate(&self) -> Result<(), String> {
        let (density, radius, degradation_rate) = match self {
            Self::Generic => return Ok(()),
            Self::Paper(p) => (p.density, p.radius, p.degradation_rate),
            Self::Plastic(p) => (p.density, p.radius, p.degradation_rate),
        };
        if !density.is_finite() || density <= 0.0 {
            return Err(format!("density must be finite and positive, got {density}"));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(format!("radius must be finite and positive, got {radius}"));
        }
        if !degradation_rate.is_finite() || degradation_rate < 0.0 {
            return Err(format!(
                "degradation_rate must be finite and non-negative, got {degradation_rate}"
            ));
        }
        Ok(())
    }
}

// ── Tracer ────────────────────────────────────────────────────────

/// Base state shared by every variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracerState {
    /// Current position.
    pub position: Point,
    /// Velocity applied in the last integration.
    pub velocity: Point,
    /// Time since emission.
    pub age: f64,
    /// Lifecycle stage.
    pub status: TracerStatus,
}

/// A simulated particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Tracer {
    id: TracerId,
    source: SourceId,
    state: TracerState,
    variant: TracerVariant,
}

impl Tracer {
    /// A freshly emitted tracer at rest.
    pub fn spawn(id: TracerId, source: SourceId, position: Point, variant: TracerVariant) -> Self {
        Self {
            id,
            source,
            state: TracerState {
                position,
                velocity: Point::ZERO,
                age: 0.0,
                status: TracerStatus::Spawned,
            },
            variant,
        }
    }

    /// Rebuild a tracer from stored parts.
    pub fn from_parts(
        id: TracerId,
        source: SourceId,
        state: TracerState,
        variant: TracerVariant,
    ) -> Self {
        Self {
            id,
            source,
            state,
            variant,
        }
    }

    /// Unique id.
    pub fn id(&self) -> TracerId {
        self.id
    }

    /// The source that emitted this tracer.
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Base state.
    pub fn state(&self) -> &TracerState {
        &self.state
    }

    /// Current position.
    pub fn position(&self) -> Point {
        self.state.position
    }

    /// Lifecycle stage.
    pub fn status(&self) -> TracerStatus {
        self.state.status
    }

    /// Physical variant.
    pub fn variant(&self) -> &TracerVariant {
        &self.variant
    }

    /// Whether the tracer is integrated and migrated.
    pub fn is_active(&self) -> bool {
        self.state.status == TracerStatus::Active
    }

    /// `Spawned -> Active`. Other stages are left alone.
    pub fn activate(&mut self) {
        if self.state.status == TracerStatus::Spawned {
            self.state.status = TracerStatus::Active;
        }
    }

    /// `Active -> Inactive`.
    pub fn beach(&mut self) {
        if self.state.status == TracerStatus::Active {
            self.state.status = TracerStatus::Inactive;
        }
    }

    /// Mark as having left the domain.
    pub fn exit(&mut self) {
        self.state.status = TracerStatus::Exited;
    }

    /// Record the result of an integration step.
    pub fn set_motion(&mut self, position: Point, velocity: Point) {
        self.state.position = position;
        self.state.velocity = velocity;
    }

    /// Advance the tracer's age.
    pub fn age_by(&mut self, dt: f64) {
        self.state.age += dt;
    }

    /// Whether the tracer has lived at least `lifetime`.
    pub fn is_expired(&self, lifetime: Option<f64>) -> bool {
        lifetime.is_some_and(|l| self.state.age >= l)
    }
}

impl fmt::Display for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tracer {} ({} from source {}) at {} [{}, age {}]",
            self.id,
            self.variant.kind(),
            self.source,
            self.state.position,
            self.state.status,
            self.state.age
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plastic() -> TracerVariant {
        TracerVariant::Plastic(PlasticParams {
            particulate: true,
            density: 950.0,
            radius: 0.002,
            degradation_rate: 1e-6,
            polymer: Polymer::Polyethylene,
        })
    }

    #[test]
    fn lifecycle_transitions() {
        let mut t = Tracer::spawn(TracerId(1), SourceId(0), Point::ZERO, plastic());
        assert_eq!(t.status(), TracerStatus::Spawned);
        t.beach();
        assert_eq!(t.status(), TracerStatus::Spawned, "spawned cannot beach");
        t.activate();
        assert!(t.is_active());
        t.beach();
        assert_eq!(t.status(), TracerStatus::Inactive);
        t.activate();
        assert_eq!(t.status(), TracerStatus::Inactive, "beached stays beached");
        t.exit();
        assert_eq!(t.status(), TracerStatus::Exited);
    }

    #[test]
    fn expiry_is_inclusive() {
        let mut t = Tracer::spawn(TracerId(1), SourceId(0), Point::ZERO, TracerVariant::Generic);
        t.age_by(5.0);
        assert!(!t.is_expired(None));
        assert!(!t.is_expired(Some(5.5)));
        assert!(t.is_expired(Some(5.0)));
    }

    #[test]
    fn hint_carries_variant_parameters() {
        let hint = plastic().integration_hint();
        assert_eq!(hint.kind, Some(VariantKind::Plastic));
        assert_eq!(hint.density, Some(950.0));
        assert!(hint.particulate);
        let generic = TracerVariant::Generic.integration_hint();
        assert_eq!(generic.density, None);
        assert_eq!(generic.degradation_rate, 0.0);
    }

    #[test]
    fn variant_validation() {
        assert!(plastic().validate().is_ok());
        let bad = TracerVariant::Paper(PaperParams {
            particulate: false,
            density: -1.0,
            radius: 0.1,
            degradation_rate: 0.0,
        });
        assert!(bad.validate().unwrap_err().contains("density"));
    }

    #[test]
    fn status_tags_round_trip() {
        for s in [
            TracerStatus::Spawned,
            TracerStatus::Active,
            TracerStatus::Inactive,
            TracerStatus::Exited,
        ] {
            assert_eq!(TracerStatus::from_tag(s.tag()), Some(s));
        }
        assert_eq!(TracerStatus::from_tag(9), None);
    }
}
