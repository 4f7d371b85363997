//! Layered procedural noise: a stack of named [`NoiseLayer`]s sampled and
//! combined in order, falling back to a single base configuration when the
//! stack is empty. See [`algorithms`] for the per-type samplers,
//! [`fractal`] for octave composition, [`warp`] for domain warping, and
//! [`lattice`] for the underlying gradient tables.

pub mod algorithms;
pub mod fractal;
pub mod interpolate;
pub mod lattice;
pub mod warp;

use nalgebra::Vector3;

use crate::codec::{Reader, Tag, Writer};
use crate::error::Result;
use crate::util::clamp;

pub use algorithms::NoiseType;
pub use fractal::FractalType;
pub use interpolate::InterpolationType;
pub use warp::WarpType;

use algorithms::generate_single;
use fractal::generate_fractal;
use lattice::Lattice;
use warp::{compute_warp, warp_position};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CombineOperation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Min,
    Max,
    Power,
    Average,
    Blend,
}

impl CombineOperation {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => CombineOperation::Subtract,
            2 => CombineOperation::Multiply,
            3 => CombineOperation::Divide,
            4 => CombineOperation::Min,
            5 => CombineOperation::Max,
            6 => CombineOperation::Power,
            7 => CombineOperation::Average,
            8 => CombineOperation::Blend,
            _ => CombineOperation::Add,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            CombineOperation::Add => 0,
            CombineOperation::Subtract => 1,
            CombineOperation::Multiply => 2,
            CombineOperation::Divide => 3,
            CombineOperation::Min => 4,
            CombineOperation::Max => 5,
            CombineOperation::Power => 6,
            CombineOperation::Average => 7,
            CombineOperation::Blend => 8,
        }
    }
}

fn combine_values(a: f32, b: f32, op: CombineOperation, weight: f32) -> f32 {
    match op {
        CombineOperation::Add => a + b * weight,
        CombineOperation::Subtract => a - b * weight,
        CombineOperation::Multiply => a * (1.0 + b * weight),
        CombineOperation::Divide => {
            if b.abs() < 0.0001 {
                a
            } else {
                a / (1.0 + b.abs() * weight)
            }
        }
        CombineOperation::Min => a.min(b),
        CombineOperation::Max => a.max(b),
        CombineOperation::Power => a.abs().powf(1.0 + b * weight) * if a < 0.0 { -1.0 } else { 1.0 },
        CombineOperation::Average => (a + b * weight) / (1.0 + weight),
        CombineOperation::Blend => {
            let t = clamp((b + 1.0) * 0.5 * weight, 0.0, 1.0);
            a * (1.0 - t) + b * t
        }
    }
}

/// One entry in a [`NoiseGenerator`]'s layer stack.
#[derive(Clone, Debug)]
pub struct NoiseLayer {
    pub name: String,
    pub enabled: bool,
    pub noise_type: NoiseType,
    pub fractal_type: FractalType,
    pub interpolation: InterpolationType,
    pub combine_op: CombineOperation,
    pub frequency: f32,
    pub amplitude: f32,
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub weight: f32,
    pub warp_type: WarpType,
    pub warp_amplitude: f32,
    pub warp_frequency: f32,
    pub warp_enabled: bool,
}

impl Default for NoiseLayer {
    fn default() -> Self {
        NoiseLayer {
            name: String::new(),
            enabled: true,
            noise_type: NoiseType::Perlin,
            fractal_type: FractalType::Fbm,
            interpolation: InterpolationType::Quintic,
            combine_op: CombineOperation::Add,
            frequency: 1.0,
            amplitude: 1.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            weight: 1.0,
            warp_type: WarpType::None,
            warp_amplitude: 1.0,
            warp_frequency: 1.0,
            warp_enabled: false,
        }
    }
}

impl NoiseLayer {
    fn named(name: &str) -> Self {
        NoiseLayer {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn validate(&mut self) {
        self.octaves = self.octaves.clamp(1, 10);
        self.persistence = clamp(self.persistence, 0.0, 1.0);
        self.lacunarity = clamp(self.lacunarity, 1.0, 4.0);
        self.weight = clamp(self.weight, 0.0, 1.0);
        self.scale.x = self.scale.x.max(0.0001);
        self.scale.y = self.scale.y.max(0.0001);
        self.scale.z = self.scale.z.max(0.0001);
    }

    fn write_object<W: std::io::Write + std::io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        let mut obj = w.begin_object("NoiseLayer")?;
        obj.write_field("name", Tag::String, |w| w.write_string(&self.name))?;
        obj.write_field("enabled", Tag::Bool, |w| w.write_bool(self.enabled))?;
        obj.write_field("noise_type", Tag::U8, |w| w.write_u8(self.noise_type.as_u8()))?;
        obj.write_field("fractal_type", Tag::U8, |w| w.write_u8(self.fractal_type.as_u8()))?;
        obj.write_field("interpolation", Tag::U8, |w| w.write_u8(self.interpolation.as_u8()))?;
        obj.write_field("combine_op", Tag::U8, |w| w.write_u8(self.combine_op.as_u8()))?;
        obj.write_field("frequency", Tag::F32, |w| w.write_f32(self.frequency))?;
        obj.write_field("amplitude", Tag::F32, |w| w.write_f32(self.amplitude))?;
        obj.write_field("octaves", Tag::I32, |w| w.write_i32(self.octaves))?;
        obj.write_field("persistence", Tag::F32, |w| w.write_f32(self.persistence))?;
        obj.write_field("lacunarity", Tag::F32, |w| w.write_f32(self.lacunarity))?;
        write_vec3(&mut obj, "offset", self.offset)?;
        write_vec3(&mut obj, "scale", self.scale)?;
        obj.write_field("weight", Tag::F32, |w| w.write_f32(self.weight))?;
        obj.write_field("warp_type", Tag::U8, |w| w.write_u8(self.warp_type.as_u8()))?;
        obj.write_field("warp_amplitude", Tag::F32, |w| w.write_f32(self.warp_amplitude))?;
        obj.write_field("warp_frequency", Tag::F32, |w| w.write_f32(self.warp_frequency))?;
        obj.write_field("warp_enabled", Tag::Bool, |w| w.write_bool(self.warp_enabled))?;
        obj.end()
    }

    fn read_object<R: std::io::Read + std::io::Seek>(r: &mut Reader<R>) -> Result<Self> {
        let mut obj = r.begin_object("NoiseLayer")?;
        let name = obj.read_field("name", Tag::String, |r, _| r.read_string())?;
        let enabled = obj.read_field("enabled", Tag::Bool, |r, _| r.read_bool())?;
        let noise_type = NoiseType::from_u8(obj.read_field("noise_type", Tag::U8, |r, _| r.read_u8())?);
        let fractal_type = FractalType::from_u8(obj.read_field("fractal_type", Tag::U8, |r, _| r.read_u8())?);
        let interpolation = InterpolationType::from_u8(obj.read_field("interpolation", Tag::U8, |r, _| r.read_u8())?);
        let combine_op = CombineOperation::from_u8(obj.read_field("combine_op", Tag::U8, |r, _| r.read_u8())?);
        let frequency = obj.read_field("frequency", Tag::F32, |r, _| r.read_f32())?;
        let amplitude = obj.read_field("amplitude", Tag::F32, |r, _| r.read_f32())?;
        let octaves = obj.read_field("octaves", Tag::I32, |r, _| r.read_i32())?;
        let persistence = obj.read_field("persistence", Tag::F32, |r, _| r.read_f32())?;
        let lacunarity = obj.read_field("lacunarity", Tag::F32, |r, _| r.read_f32())?;
        let offset = read_vec3(&mut obj, "offset")?;
        let scale = read_vec3(&mut obj, "scale")?;
        let weight = obj.read_field("weight", Tag::F32, |r, _| r.read_f32())?;
        let warp_type = WarpType::from_u8(obj.read_field("warp_type", Tag::U8, |r, _| r.read_u8())?);
        let warp_amplitude = obj.read_field("warp_amplitude", Tag::F32, |r, _| r.read_f32())?;
        let warp_frequency = obj.read_field("warp_frequency", Tag::F32, |r, _| r.read_f32())?;
        let warp_enabled = obj.read_field("warp_enabled", Tag::Bool, |r, _| r.read_bool())?;
        obj.end()?;
        Ok(NoiseLayer {
            name,
            enabled,
            noise_type,
            fractal_type,
            interpolation,
            combine_op,
            frequency,
            amplitude,
            octaves,
            persistence,
            lacunarity,
            offset,
            scale,
            weight,
            warp_type,
            warp_amplitude,
            warp_frequency,
            warp_enabled,
        })
    }
}

fn write_vec3<W: std::io::Write + std::io::Seek>(
    obj: &mut crate::codec::writer::ObjectWriter<W>,
    name: &'static str,
    v: Vector3<f32>,
) -> Result<()> {
    obj.write_field(name, Tag::Object, |w| {
        let mut c = w.begin_object_body("Vec3")?;
        c.write_field("x", Tag::F32, |w| w.write_f32(v.x))?;
        c.write_field("y", Tag::F32, |w| w.write_f32(v.y))?;
        c.write_field("z", Tag::F32, |w| w.write_f32(v.z))?;
        c.end()
    })
}

fn read_vec3<R: std::io::Read + std::io::Seek>(
    obj: &mut crate::codec::reader::ObjectReader<R>,
    name: &'static str,
) -> Result<Vector3<f32>> {
    obj.read_field(name, Tag::Object, |r, _| {
        let mut c = r.begin_object_body("Vec3")?;
        let x = c.read_field("x", Tag::F32, |r, _| r.read_f32())?;
        let y = c.read_field("y", Tag::F32, |r, _| r.read_f32())?;
        let z = c.read_field("z", Tag::F32, |r, _| r.read_f32())?;
        c.end()?;
        Ok(Vector3::new(x, y, z))
    })
}

/// Global layer stack plus fallback base parameters used when the stack is
/// empty. `seed` deterministically governs every pseudo-random table this
/// generator touches (the per-type hashes in [`algorithms`] directly, and
/// the gradient [`Lattice`] built from it).
pub struct NoiseGenerator {
    seed: u32,
    lattice: Lattice,
    noise_type: NoiseType,
    fractal_type: FractalType,
    interpolation: InterpolationType,
    octaves: i32,
    persistence: f32,
    lacunarity: f32,
    frequency: f32,
    amplitude: f32,
    scale: Vector3<f32>,
    offset: Vector3<f32>,
    warp_enabled: bool,
    warp_type: WarpType,
    warp_amplitude: f32,
    warp_frequency: f32,
    layers: Vec<NoiseLayer>,
    modifier: Option<Box<dyn Fn(f32) -> f32 + Send + Sync>>,
}

impl NoiseGenerator {
    pub fn new(seed: u32) -> Self {
        let mut gen = NoiseGenerator {
            seed,
            lattice: Lattice::new(seed),
            noise_type: NoiseType::Perlin,
            fractal_type: FractalType::Fbm,
            interpolation: InterpolationType::Quintic,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            frequency: 0.01,
            amplitude: 1.0,
            scale: Vector3::new(1.0, 1.0, 1.0),
            offset: Vector3::new(0.0, 0.0, 0.0),
            warp_enabled: false,
            warp_type: WarpType::None,
            warp_amplitude: 1.0,
            warp_frequency: 1.0,
            layers: Vec::new(),
            modifier: None,
        };
        gen.validate_parameters();
        gen
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Rebuilds the gradient lattice against a new seed. Layer-level state
    /// is untouched.
    pub fn set_seed(&mut self, seed: u32) {
        self.seed = seed;
        self.lattice = Lattice::new(seed);
    }

    pub fn set_modifier(&mut self, modifier: impl Fn(f32) -> f32 + Send + Sync + 'static) {
        self.modifier = Some(Box::new(modifier));
    }

    pub fn clear_modifier(&mut self) {
        self.modifier = None;
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn layer(&self, name: &str) -> Option<&NoiseLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    fn layer_mut(&mut self, name: &str) -> Option<&mut NoiseLayer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    pub fn create_layer(&mut self, name: &str) -> bool {
        if self.layers.iter().any(|l| l.name == name) {
            return false;
        }
        self.layers.push(NoiseLayer::named(name));
        true
    }

    pub fn remove_layer(&mut self, name: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| l.name != name);
        self.layers.len() != before
    }

    pub fn clear_layers(&mut self) {
        self.layers.clear();
    }

    /// Mutable access to a named layer for field-by-field configuration
    /// (`setLayerFrequency`, `setLayerOffset`, etc. in the original API all
    /// collapse to "mutate the layer" here since the fields are public).
    pub fn layer_mut_by_name(&mut self, name: &str) -> Option<&mut NoiseLayer> {
        self.layer_mut(name)
    }

    fn validate_parameters(&mut self) {
        self.octaves = self.octaves.clamp(1, 10);
        self.persistence = clamp(self.persistence, 0.0, 1.0);
        self.lacunarity = clamp(self.lacunarity, 1.0, 4.0);
        self.scale.x = self.scale.x.max(0.0001);
        self.scale.y = self.scale.y.max(0.0001);
        self.scale.z = self.scale.z.max(0.0001);
        for layer in &mut self.layers {
            layer.validate();
        }
    }

    fn apply_scale_offset(pos: (f32, f32, f32), scale: Vector3<f32>, offset: Vector3<f32>) -> (f32, f32, f32) {
        (pos.0 * scale.x + offset.x, pos.1 * scale.y + offset.y, pos.2 * scale.z + offset.z)
    }

    fn sample_single_or_fractal(&self, noise_type: NoiseType, fractal_type: FractalType, pos: (f32, f32, f32), octaves: i32, persistence: f32, lacunarity: f32) -> f32 {
        if fractal_type == FractalType::None {
            generate_single(&self.lattice, self.seed, self.interpolation, noise_type, pos.0, pos.1, pos.2)
        } else {
            generate_fractal(&self.lattice, self.seed, self.interpolation, noise_type, fractal_type, pos.0, pos.1, pos.2, octaves, persistence, lacunarity)
        }
    }

    /// Samples the full layering pipeline at a world position.
    pub fn generate(&self, x: f32, y: f32, z: f32) -> f32 {
        let mut pos = Self::apply_scale_offset((x, y, z), self.scale, self.offset);

        if self.warp_enabled {
            pos = warp_position(&self.lattice, self.warp_type, pos, self.warp_amplitude, self.warp_frequency);
        }

        if !self.layers.is_empty() {
            let mut result = 0.0;
            let mut total_weight = 0.0;
            let mut first = true;

            for layer in &self.layers {
                if !layer.enabled {
                    continue;
                }

                let mut layer_pos = Self::apply_scale_offset(pos, layer.scale, layer.offset);
                if layer.warp_enabled {
                    layer_pos = warp_position(&self.lattice, layer.warp_type, layer_pos, layer.warp_amplitude, layer.warp_frequency);
                }

                let scaled = (layer_pos.0 * layer.frequency, layer_pos.1 * layer.frequency, layer_pos.2 * layer.frequency);
                let mut value = self.sample_single_or_fractal(layer.noise_type, layer.fractal_type, scaled, layer.octaves, layer.persistence, layer.lacunarity);
                value *= layer.amplitude;

                if first {
                    result = value;
                    first = false;
                } else {
                    result = combine_values(result, value, layer.combine_op, layer.weight);
                }
                total_weight += layer.weight;
            }

            if total_weight > 0.0 && !first {
                result /= total_weight;
            }

            return match &self.modifier {
                Some(m) => m(result),
                None => result,
            };
        }

        let scaled = (pos.0 * self.frequency, pos.1 * self.frequency, pos.2 * self.frequency);
        let mut result = self.sample_single_or_fractal(self.noise_type, self.fractal_type, scaled, self.octaves, self.persistence, self.lacunarity);
        result *= self.amplitude;

        match &self.modifier {
            Some(m) => m(result),
            None => result,
        }
    }

    pub fn generate_vec(&self, pos: Vector3<f32>) -> f32 {
        self.generate(pos.x, pos.y, pos.z)
    }

    pub fn generate_2d(&self, x: f32, y: f32) -> f32 {
        self.generate(x, y, 0.0)
    }

    fn install_layer_stack(&mut self, layers: Vec<NoiseLayer>, base_noise: NoiseType, base_fractal: FractalType, octaves: i32, persistence: f32, lacunarity: f32, frequency: f32) {
        self.layers = layers;
        self.noise_type = base_noise;
        self.fractal_type = base_fractal;
        self.octaves = octaves;
        self.persistence = persistence;
        self.lacunarity = lacunarity;
        self.frequency = frequency;
        self.amplitude = 1.0;
        self.warp_enabled = false;
        self.validate_parameters();
    }

    /// Two base layers plus, when `mountainous`, a ridged layer and
    /// fractal domain warp.
    pub fn preset_terrain(&mut self, mountainous: bool) {
        let mut base = NoiseLayer::named("base");
        base.noise_type = NoiseType::Perlin;
        base.fractal_type = FractalType::Fbm;
        base.octaves = 4;
        base.persistence = 0.5;
        base.lacunarity = 2.0;
        base.frequency = 0.01;
        base.amplitude = 1.0;
        base.weight = 1.0;

        let mut detail = NoiseLayer::named("detail");
        detail.noise_type = NoiseType::Perlin;
        detail.fractal_type = FractalType::Fbm;
        detail.octaves = 6;
        detail.persistence = 0.4;
        detail.lacunarity = 2.5;
        detail.frequency = 0.04;
        detail.amplitude = 0.2;
        detail.combine_op = CombineOperation::Add;
        detail.weight = 0.5;

        let mut layers = vec![base, detail];

        if mountainous {
            let mut ridges = NoiseLayer::named("ridges");
            ridges.noise_type = NoiseType::Ridged;
            ridges.fractal_type = FractalType::Fbm;
            ridges.octaves = 3;
            ridges.persistence = 0.7;
            ridges.lacunarity = 2.3;
            ridges.frequency = 0.008;
            ridges.amplitude = 0.8;
            ridges.combine_op = CombineOperation::Add;
            ridges.weight = 0.7;
            layers.push(ridges);
        }

        self.install_layer_stack(layers, NoiseType::Perlin, FractalType::Fbm, 4, 0.5, 2.0, 0.01);

        if mountainous {
            self.warp_enabled = true;
            self.warp_type = WarpType::Fractal;
            self.warp_amplitude = 20.0;
            self.warp_frequency = 0.005;
        }
    }

    pub fn preset_caves(&mut self) {
        let mut base = NoiseLayer::named("base");
        base.noise_type = NoiseType::Perlin;
        base.fractal_type = FractalType::Fbm;
        base.octaves = 3;
        base.persistence = 0.4;
        base.lacunarity = 2.0;
        base.frequency = 0.05;
        base.amplitude = 1.0;
        base.weight = 1.0;

        let mut tunnels = NoiseLayer::named("tunnels");
        tunnels.noise_type = NoiseType::Worley;
        tunnels.fractal_type = FractalType::None;
        tunnels.frequency = 0.03;
        tunnels.amplitude = 1.0;
        tunnels.combine_op = CombineOperation::Multiply;
        tunnels.weight = 0.8;

        self.install_layer_stack(vec![base, tunnels], NoiseType::Perlin, FractalType::Fbm, 3, 0.4, 2.0, 0.05);
        self.warp_enabled = true;
        self.warp_type = WarpType::Basic;
        self.warp_amplitude = 5.0;
        self.warp_frequency = 0.02;
    }

    pub fn preset_ore_distribution(&mut self) {
        let mut distribution = NoiseLayer::named("distribution");
        distribution.noise_type = NoiseType::Perlin;
        distribution.fractal_type = FractalType::Fbm;
        distribution.octaves = 2;
        distribution.persistence = 0.5;
        distribution.lacunarity = 2.0;
        distribution.frequency = 0.1;
        distribution.amplitude = 1.0;
        distribution.weight = 1.0;

        let mut veins = NoiseLayer::named("veins");
        veins.noise_type = NoiseType::Worley;
        veins.fractal_type = FractalType::None;
        veins.frequency = 0.2;
        veins.amplitude = 1.0;
        veins.combine_op = CombineOperation::Multiply;
        veins.weight = 0.6;

        let mut deposits = NoiseLayer::named("deposits");
        deposits.noise_type = NoiseType::Value;
        deposits.fractal_type = FractalType::Fbm;
        deposits.octaves = 3;
        deposits.persistence = 0.3;
        deposits.lacunarity = 2.5;
        deposits.frequency = 0.3;
        deposits.amplitude = 0.5;
        deposits.combine_op = CombineOperation::Add;
        deposits.weight = 0.4;

        self.install_layer_stack(vec![distribution, veins, deposits], NoiseType::Perlin, FractalType::Fbm, 2, 0.5, 2.0, 0.1);
    }

    pub fn preset_biome_blend(&mut self) {
        let mut temperature = NoiseLayer::named("temperature");
        temperature.noise_type = NoiseType::Perlin;
        temperature.fractal_type = FractalType::Fbm;
        temperature.octaves = 3;
        temperature.persistence = 0.5;
        temperature.lacunarity = 2.0;
        temperature.frequency = 0.01;
        temperature.amplitude = 1.0;
        temperature.weight = 1.0;

        let mut humidity = NoiseLayer::named("humidity");
        humidity.noise_type = NoiseType::Perlin;
        humidity.fractal_type = FractalType::Fbm;
        humidity.octaves = 3;
        humidity.persistence = 0.5;
        humidity.lacunarity = 2.0;
        humidity.frequency = 0.01;
        humidity.amplitude = 1.0;
        humidity.offset = Vector3::new(123.0, 456.0, 789.0);
        humidity.combine_op = CombineOperation::Blend;
        humidity.weight = 1.0;

        let mut altitude = NoiseLayer::named("altitude");
        altitude.noise_type = NoiseType::Perlin;
        altitude.fractal_type = FractalType::Fbm;
        altitude.octaves = 4;
        altitude.persistence = 0.6;
        altitude.lacunarity = 2.2;
        altitude.frequency = 0.02;
        altitude.amplitude = 0.7;
        altitude.offset = Vector3::new(987.0, 654.0, 321.0);
        altitude.combine_op = CombineOperation::Multiply;
        altitude.weight = 0.5;

        self.install_layer_stack(vec![temperature, humidity, altitude], NoiseType::Perlin, FractalType::Fbm, 3, 0.5, 2.0, 0.01);
    }

    pub fn preset_detail_texture(&mut self) {
        let mut base = NoiseLayer::named("base");
        base.noise_type = NoiseType::Value;
        base.fractal_type = FractalType::Fbm;
        base.octaves = 5;
        base.persistence = 0.5;
        base.lacunarity = 2.0;
        base.frequency = 0.2;
        base.amplitude = 1.0;
        base.weight = 1.0;

        let mut fine = NoiseLayer::named("fine");
        fine.noise_type = NoiseType::Perlin;
        fine.fractal_type = FractalType::Fbm;
        fine.octaves = 7;
        fine.persistence = 0.6;
        fine.lacunarity = 2.5;
        fine.frequency = 0.5;
        fine.amplitude = 0.3;
        fine.combine_op = CombineOperation::Add;
        fine.weight = 0.4;

        let mut spots = NoiseLayer::named("spots");
        spots.noise_type = NoiseType::Worley;
        spots.fractal_type = FractalType::None;
        spots.frequency = 0.4;
        spots.amplitude = 0.5;
        spots.combine_op = CombineOperation::Multiply;
        spots.weight = 0.3;

        self.install_layer_stack(vec![base, fine, spots], NoiseType::Value, FractalType::Fbm, 5, 0.5, 2.0, 0.2);
    }

    pub fn write_object<W: std::io::Write + std::io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        let mut obj = w.begin_object("NoiseGenerator")?;
        obj.write_field("seed", Tag::U32, |w| w.write_u32(self.seed))?;
        obj.write_field("noise_type", Tag::U8, |w| w.write_u8(self.noise_type.as_u8()))?;
        obj.write_field("fractal_type", Tag::U8, |w| w.write_u8(self.fractal_type.as_u8()))?;
        obj.write_field("interpolation", Tag::U8, |w| w.write_u8(self.interpolation.as_u8()))?;
        obj.write_field("octaves", Tag::I32, |w| w.write_i32(self.octaves))?;
        obj.write_field("persistence", Tag::F32, |w| w.write_f32(self.persistence))?;
        obj.write_field("lacunarity", Tag::F32, |w| w.write_f32(self.lacunarity))?;
        obj.write_field("frequency", Tag::F32, |w| w.write_f32(self.frequency))?;
        obj.write_field("amplitude", Tag::F32, |w| w.write_f32(self.amplitude))?;
        write_vec3(&mut obj, "scale", self.scale)?;
        write_vec3(&mut obj, "offset", self.offset)?;
        obj.write_field("warp_enabled", Tag::Bool, |w| w.write_bool(self.warp_enabled))?;
        obj.write_field("warp_type", Tag::U8, |w| w.write_u8(self.warp_type.as_u8()))?;
        obj.write_field("warp_amplitude", Tag::F32, |w| w.write_f32(self.warp_amplitude))?;
        obj.write_field("warp_frequency", Tag::F32, |w| w.write_f32(self.warp_frequency))?;
        obj.write_field("layers", Tag::Array, |w| {
            let mut arr = w.begin_array_body(self.layers.len(), Tag::Object)?;
            for layer in &self.layers {
                arr.push(Tag::Object, |w| layer.write_object(w))?;
            }
            arr.end()
        })?;
        obj.end()
    }

    pub fn read_object<R: std::io::Read + std::io::Seek>(r: &mut Reader<R>) -> Result<Self> {
        let mut obj = r.begin_object("NoiseGenerator")?;
        let seed = obj.read_field("seed", Tag::U32, |r, _| r.read_u32())?;
        let noise_type = NoiseType::from_u8(obj.read_field("noise_type", Tag::U8, |r, _| r.read_u8())?);
        let fractal_type = FractalType::from_u8(obj.read_field("fractal_type", Tag::U8, |r, _| r.read_u8())?);
        let interpolation = InterpolationType::from_u8(obj.read_field("interpolation", Tag::U8, |r, _| r.read_u8())?);
        let octaves = obj.read_field("octaves", Tag::I32, |r, _| r.read_i32())?;
        let persistence = obj.read_field("persistence", Tag::F32, |r, _| r.read_f32())?;
        let lacunarity = obj.read_field("lacunarity", Tag::F32, |r, _| r.read_f32())?;
        let frequency = obj.read_field("frequency", Tag::F32, |r, _| r.read_f32())?;
        let amplitude = obj.read_field("amplitude", Tag::F32, |r, _| r.read_f32())?;
        let scale = read_vec3(&mut obj, "scale")?;
        let offset = read_vec3(&mut obj, "offset")?;
        let warp_enabled = obj.read_field("warp_enabled", Tag::Bool, |r, _| r.read_bool())?;
        let warp_type = WarpType::from_u8(obj.read_field("warp_type", Tag::U8, |r, _| r.read_u8())?);
        let warp_amplitude = obj.read_field("warp_amplitude", Tag::F32, |r, _| r.read_f32())?;
        let warp_frequency = obj.read_field("warp_frequency", Tag::F32, |r, _| r.read_f32())?;
        let mut layers = Vec::new();
        obj.read_field("layers", Tag::Array, |r, _size| {
            let mut arr = r.begin_array_body()?;
            while let Some(layer) = arr.next(|r, _tag, _size| NoiseLayer::read_object(r))? {
                layers.push(layer);
            }
            arr.end()
        })?;
        obj.end()?;

        let mut gen = NoiseGenerator {
            seed,
            lattice: Lattice::new(seed),
            noise_type,
            fractal_type,
            interpolation,
            octaves,
            persistence,
            lacunarity,
            frequency,
            amplitude,
            scale,
            offset,
            warp_enabled,
            warp_type,
            warp_amplitude,
            warp_frequency,
            layers,
            modifier: None,
        };
        gen.validate_parameters();
        Ok(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_terrain_has_two_layers_by_default() {
        let mut gen = NoiseGenerator::new(1);
        gen.preset_terrain(false);
        assert_eq!(gen.layer_count(), 2);
        assert_eq!(gen.layer_names(), vec!["base", "detail"]);
        let base = gen.layer("base").unwrap();
        assert_eq!(base.noise_type, NoiseType::Perlin);
        assert_eq!(base.fractal_type, FractalType::Fbm);
        assert!((base.frequency - 0.01).abs() < 1e-6);
    }

    #[test]
    fn preset_terrain_mountainous_adds_ridges_and_warp() {
        let mut gen = NoiseGenerator::new(1);
        gen.preset_terrain(true);
        assert_eq!(gen.layer_count(), 3);
        assert!(gen.warp_enabled);
        assert_eq!(gen.warp_type, WarpType::Fractal);
    }

    #[test]
    fn noise_range_in_bounds_for_default_generator() {
        let gen = NoiseGenerator::new(42);
        for i in 0..50 {
            let v = gen.generate(i as f32 * 1.7, -i as f32 * 0.4, i as f32 * 0.11);
            assert!((-1.5..=1.5).contains(&v), "value {v} out of expected range");
        }
    }

    #[test]
    fn create_layer_rejects_duplicate_names() {
        let mut gen = NoiseGenerator::new(1);
        assert!(gen.create_layer("a"));
        assert!(!gen.create_layer("a"));
        assert!(gen.remove_layer("a"));
        assert!(!gen.remove_layer("a"));
    }
}
