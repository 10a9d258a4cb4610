//! Snapshot sources for the create mode.

use std::path::PathBuf;

use archive::ArchiveError;
use nbody::sampling::{plummer_sphere, uniform_box};
use nbody::{Particle, ParticleSet, Snapshot};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use units::{Quantity, Time, Unit, UnitError};

use crate::plugins::Registry;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid model arguments: {0}")]
    Args(#[from] serde_yaml::Error),
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("{0}")]
    Invalid(String),
}

/// Produces one snapshot when run.
pub trait Model {
    fn run(&mut self) -> Result<Snapshot, ModelError>;
}

pub type ModelConstructor = fn(&serde_yaml::Value) -> Result<Box<dyn Model>, ModelError>;

/// A model built from its deserialized arguments.
trait FromModelArgs: Sized {
    type Args: DeserializeOwned;

    fn from_model_args(args: Self::Args) -> Result<Self, ModelError>;
}

fn construct<M: Model + FromModelArgs + 'static>(args: &serde_yaml::Value) -> Result<Box<dyn Model>, ModelError> {
    let args = analysis::args::parse_args::<M::Args>(args)?;
    Ok(Box::new(M::from_model_args(args)?))
}

pub fn register_builtin_models(registry: &mut Registry<ModelConstructor>) {
    registry.register("body", construct::<BodyModel>);
    registry.register("plummer_sphere", construct::<PlummerModel>);
    registry.register("set", construct::<ParticleSetModel>);
    registry.register("csv", construct::<CsvModel>);
    registry.register("fits", construct::<FitsModel>);
}

/// A single baryonic particle at rest at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyModel {
    /// M_sun
    pub mass: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyArgs {
    mass: Quantity,
}

impl FromModelArgs for BodyModel {
    type Args = BodyArgs;

    fn from_model_args(args: BodyArgs) -> Result<Self, ModelError> {
        Ok(Self {
            mass: args.mass.value_in(&Unit::msun())?,
        })
    }
}

impl Model for BodyModel {
    fn run(&mut self) -> Result<Snapshot, ModelError> {
        let particle = Particle::new(self.mass, [0.0; 3], [0.0; 3]);
        Ok(Snapshot::new(vec![particle].into(), Time::zero()))
    }
}

/// An equal-mass Plummer sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct PlummerModel {
    pub number_of_particles: usize,
    pub mass: f64,
    pub radius: f64,
    pub seed: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlummerArgs {
    number_of_particles: usize,
    mass: Quantity,
    radius: Quantity,
    #[serde(default)]
    seed: u64,
}

impl FromModelArgs for PlummerModel {
    type Args = PlummerArgs;

    fn from_model_args(args: PlummerArgs) -> Result<Self, ModelError> {
        Ok(Self {
            number_of_particles: args.number_of_particles,
            mass: args.mass.value_in(&Unit::msun())?,
            radius: args.radius.value_in(&Unit::kpc())?,
            seed: args.seed,
        })
    }
}

impl Model for PlummerModel {
    fn run(&mut self) -> Result<Snapshot, ModelError> {
        let particles = plummer_sphere(self.number_of_particles, self.mass, self.radius, self.seed);
        Ok(Snapshot::new(particles, Time::zero()))
    }
}

/// Equal-mass particles spread uniformly over a box, with Gaussian velocities.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSetModel {
    pub number_of_particles: usize,
    pub total_mass: f64,
    pub velocity_std: f64,
    pub widths: [f64; 3],
    pub seed: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleSetArgs {
    number_of_particles: usize,
    total_mass: Quantity,
    velocity_std: Quantity,
    x_width: Quantity,
    y_width: Quantity,
    z_width: Quantity,
    #[serde(default)]
    seed: u64,
}

impl FromModelArgs for ParticleSetModel {
    type Args = ParticleSetArgs;

    fn from_model_args(args: ParticleSetArgs) -> Result<Self, ModelError> {
        let kpc = Unit::kpc();
        Ok(Self {
            number_of_particles: args.number_of_particles,
            total_mass: args.total_mass.value_in(&Unit::msun())?,
            velocity_std: args.velocity_std.value_in(&Unit::kms())?,
            widths: [
                args.x_width.value_in(&kpc)?,
                args.y_width.value_in(&kpc)?,
                args.z_width.value_in(&kpc)?,
            ],
            seed: args.seed,
        })
    }
}

impl Model for ParticleSetModel {
    fn run(&mut self) -> Result<Snapshot, ModelError> {
        let particles = uniform_box(
            self.number_of_particles,
            self.total_mass,
            self.velocity_std,
            self.widths,
            self.seed,
        );
        Ok(Snapshot::new(particles, Time::zero()))
    }
}

/// Mass unit of model tables written by NEMO-based tools.
pub const DEFAULT_CSV_MASS_UNIT: f64 = 232_500.0;

/// Particles from a table with columns `x,y,z,vx,vy,vz,m[,barion]`.
///
/// Positions are in kpc, velocities in km/s and masses in `mass_unit`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvModel {
    pub path: PathBuf,
    pub delimiter: u8,
    /// M_sun per unit of the `m` column
    pub mass_unit: f64,
}

fn default_delimiter() -> char {
    ','
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvArgs {
    path: PathBuf,
    #[serde(default = "default_delimiter")]
    delimiter: char,
    #[serde(default)]
    mass_unit: Option<Quantity>,
}

impl FromModelArgs for CsvModel {
    type Args = CsvArgs;

    fn from_model_args(args: CsvArgs) -> Result<Self, ModelError> {
        let delimiter = u8::try_from(args.delimiter)
            .map_err(|_| ModelError::Invalid(format!("delimiter `{}` is not ASCII", args.delimiter)))?;
        let mass_unit = match args.mass_unit {
            Some(quantity) => quantity.value_in(&Unit::msun())?,
            None => DEFAULT_CSV_MASS_UNIT,
        };
        Ok(Self {
            path: args.path,
            delimiter,
            mass_unit,
        })
    }
}

#[derive(Deserialize)]
struct CsvRow {
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    m: f64,
    #[serde(default)]
    barion: Option<String>,
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

impl Model for CsvModel {
    fn run(&mut self) -> Result<Snapshot, ModelError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(ArchiveError::from)?;

        let mut particles = ParticleSet::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(ArchiveError::from)?;
            let is_baryon = match row.barion.as_deref() {
                None | Some("") => true,
                Some(text) => parse_flag(text)
                    .ok_or_else(|| ModelError::Invalid(format!("`{text}` is not a baryon flag")))?,
            };
            let mut particle = Particle::new(
                row.m * self.mass_unit,
                [row.x, row.y, row.z],
                [row.vx, row.vy, row.vz],
            );
            particle.is_baryon = is_baryon;
            particles.push(particle);
        }
        Ok(Snapshot::new(particles, Time::zero()))
    }
}

/// One snapshot of an existing archive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitsModel {
    pub filename: PathBuf,
    /// Zero-based position of the snapshot in the archive
    #[serde(default)]
    pub snapshot_number: usize,
}

impl FromModelArgs for FitsModel {
    type Args = FitsModel;

    fn from_model_args(args: FitsModel) -> Result<Self, ModelError> {
        Ok(args)
    }
}

impl Model for FitsModel {
    fn run(&mut self) -> Result<Snapshot, ModelError> {
        archive::from_fits(&self.filename, None, None)?
            .nth(self.snapshot_number)
            .ok_or_else(|| {
                ModelError::Invalid(format!(
                    "{} has no snapshot {}",
                    self.filename.display(),
                    self.snapshot_number
                ))
            })?
            .map_err(ModelError::from)
    }
}
