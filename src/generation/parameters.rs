//! Typed configuration bag for a single generation "profile": first-class
//! terrain/water/cave/feature fields plus four generic extension maps
//! (float/int/bool/string) and a vec3 map, with nine named presets.

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::codec::{Reader, Tag, Writer};
use crate::error::Result;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TerrainMode {
    Flat,
    HeightMap,
    Volumetric,
    Islands,
    Mountains,
    Desert,
    Custom,
}

impl TerrainMode {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => TerrainMode::Volumetric,
            2 => TerrainMode::Islands,
            3 => TerrainMode::Mountains,
            4 => TerrainMode::Desert,
            5 => TerrainMode::Custom,
            _ => TerrainMode::HeightMap,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            TerrainMode::HeightMap => 0,
            TerrainMode::Volumetric => 1,
            TerrainMode::Islands => 2,
            TerrainMode::Mountains => 3,
            TerrainMode::Desert => 4,
            TerrainMode::Custom => 5,
            TerrainMode::Flat => 6,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlacementPattern {
    Random,
    Grid,
    Clustered,
    Biome,
    Landmark,
    EdgeClustered,
    Custom,
}

impl PlacementPattern {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => PlacementPattern::Grid,
            2 => PlacementPattern::Clustered,
            3 => PlacementPattern::Biome,
            4 => PlacementPattern::Landmark,
            5 => PlacementPattern::EdgeClustered,
            6 => PlacementPattern::Custom,
            _ => PlacementPattern::Random,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PlacementPattern::Random => 0,
            PlacementPattern::Grid => 1,
            PlacementPattern::Clustered => 2,
            PlacementPattern::Biome => 3,
            PlacementPattern::Landmark => 4,
            PlacementPattern::EdgeClustered => 5,
            PlacementPattern::Custom => 6,
        }
    }
}

/// A single generation profile: terrain shape, toggles, noise-layer
/// references, and arbitrary string-keyed extension parameters.
pub struct GenerationParameters {
    terrain_mode: TerrainMode,
    min_height: f32,
    max_height: f32,
    water_level: f32,
    water_enabled: bool,
    caves_enabled: bool,
    cave_density: f32,
    cave_size: f32,
    terrain_noise_layer: String,
    cave_noise_layer: String,
    feature_noise_layer: String,
    biome_noise_layer: String,
    terrain_roughness: f32,
    terrain_erosion: f32,
    feature_placement_pattern: PlacementPattern,
    feature_density: f32,
    biome_blend_distance: f32,
    feature_placement_control: String,
    distribution_control: String,

    enabled_feature_types: HashMap<String, bool>,
    feature_type_densities: HashMap<String, f32>,
    float_params: HashMap<String, f32>,
    int_params: HashMap<String, i32>,
    bool_params: HashMap<String, bool>,
    string_params: HashMap<String, String>,
    vec3_params: HashMap<String, Vector3<f32>>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        GenerationParameters {
            terrain_mode: TerrainMode::HeightMap,
            min_height: 0.0,
            max_height: 100.0,
            water_level: 50.0,
            water_enabled: true,
            caves_enabled: true,
            cave_density: 0.5,
            cave_size: 1.0,
            terrain_noise_layer: String::new(),
            cave_noise_layer: String::new(),
            feature_noise_layer: String::new(),
            biome_noise_layer: String::new(),
            terrain_roughness: 0.5,
            terrain_erosion: 0.1,
            feature_placement_pattern: PlacementPattern::Random,
            feature_density: 0.5,
            biome_blend_distance: 8.0,
            feature_placement_control: String::new(),
            distribution_control: String::new(),
            enabled_feature_types: HashMap::new(),
            feature_type_densities: HashMap::new(),
            float_params: HashMap::new(),
            int_params: HashMap::new(),
            bool_params: HashMap::new(),
            string_params: HashMap::new(),
            vec3_params: HashMap::new(),
        }
    }
}

impl GenerationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terrain_mode(&self) -> TerrainMode {
        self.terrain_mode
    }

    pub fn set_terrain_mode(&mut self, mode: TerrainMode) {
        self.terrain_mode = mode;
    }

    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn set_height_range(&mut self, min: f32, max: f32) {
        self.min_height = min;
        self.max_height = max;
    }

    pub fn water_level(&self) -> f32 {
        self.water_level
    }

    pub fn set_water_level(&mut self, level: f32) {
        self.water_level = level;
    }

    pub fn water_enabled(&self) -> bool {
        self.water_enabled
    }

    pub fn enable_water(&mut self, enable: bool) {
        self.water_enabled = enable;
    }

    pub fn caves_enabled(&self) -> bool {
        self.caves_enabled
    }

    pub fn enable_caves(&mut self, enable: bool) {
        self.caves_enabled = enable;
    }

    pub fn cave_density(&self) -> f32 {
        self.cave_density
    }

    pub fn set_cave_density(&mut self, density: f32) {
        self.cave_density = density.clamp(0.0, 1.0);
    }

    pub fn cave_size(&self) -> f32 {
        self.cave_size
    }

    pub fn set_cave_size(&mut self, size: f32) {
        self.cave_size = size.clamp(0.1, 10.0);
    }

    pub fn terrain_noise_layer(&self) -> &str {
        &self.terrain_noise_layer
    }

    pub fn set_terrain_noise_layer(&mut self, id: impl Into<String>) {
        self.terrain_noise_layer = id.into();
    }

    pub fn cave_noise_layer(&self) -> &str {
        &self.cave_noise_layer
    }

    pub fn set_cave_noise_layer(&mut self, id: impl Into<String>) {
        self.cave_noise_layer = id.into();
    }

    pub fn feature_noise_layer(&self) -> &str {
        &self.feature_noise_layer
    }

    pub fn set_feature_noise_layer(&mut self, id: impl Into<String>) {
        self.feature_noise_layer = id.into();
    }

    pub fn biome_noise_layer(&self) -> &str {
        &self.biome_noise_layer
    }

    pub fn set_biome_noise_layer(&mut self, id: impl Into<String>) {
        self.biome_noise_layer = id.into();
    }

    pub fn terrain_roughness(&self) -> f32 {
        self.terrain_roughness
    }

    pub fn set_terrain_roughness(&mut self, roughness: f32) {
        self.terrain_roughness = roughness.clamp(0.0, 1.0);
    }

    pub fn terrain_erosion(&self) -> f32 {
        self.terrain_erosion
    }

    pub fn set_terrain_erosion(&mut self, erosion: f32) {
        self.terrain_erosion = erosion.clamp(0.0, 1.0);
    }

    pub fn feature_placement_pattern(&self) -> PlacementPattern {
        self.feature_placement_pattern
    }

    pub fn set_feature_placement_pattern(&mut self, pattern: PlacementPattern) {
        self.feature_placement_pattern = pattern;
    }

    pub fn feature_density(&self) -> f32 {
        self.feature_density
    }

    pub fn set_feature_density(&mut self, density: f32) {
        self.feature_density = density.clamp(0.0, 1.0);
    }

    pub fn biome_blend_distance(&self) -> f32 {
        self.biome_blend_distance
    }

    pub fn set_biome_blend_distance(&mut self, distance: f32) {
        self.biome_blend_distance = distance;
    }

    pub fn feature_placement_control(&self) -> &str {
        &self.feature_placement_control
    }

    pub fn set_feature_placement_control(&mut self, id: impl Into<String>) {
        self.feature_placement_control = id.into();
    }

    pub fn distribution_control(&self) -> &str {
        &self.distribution_control
    }

    pub fn set_distribution_control(&mut self, id: impl Into<String>) {
        self.distribution_control = id.into();
    }

    pub fn enable_feature_type(&mut self, feature_type: impl Into<String>, enable: bool) {
        self.enabled_feature_types.insert(feature_type.into(), enable);
    }

    /// Feature types default to enabled when never registered.
    pub fn is_feature_type_enabled(&self, feature_type: &str) -> bool {
        *self.enabled_feature_types.get(feature_type).unwrap_or(&true)
    }

    pub fn set_feature_type_density(&mut self, feature_type: impl Into<String>, density: f32) {
        self.feature_type_densities.insert(feature_type.into(), density);
    }

    pub fn feature_type_density(&self, feature_type: &str, default: f32) -> f32 {
        *self.feature_type_densities.get(feature_type).unwrap_or(&default)
    }

    pub fn set_float_param(&mut self, name: impl Into<String>, value: f32) {
        self.float_params.insert(name.into(), value);
    }

    pub fn float_param(&self, name: &str, default: f32) -> f32 {
        *self.float_params.get(name).unwrap_or(&default)
    }

    pub fn set_int_param(&mut self, name: impl Into<String>, value: i32) {
        self.int_params.insert(name.into(), value);
    }

    pub fn int_param(&self, name: &str, default: i32) -> i32 {
        *self.int_params.get(name).unwrap_or(&default)
    }

    pub fn set_bool_param(&mut self, name: impl Into<String>, value: bool) {
        self.bool_params.insert(name.into(), value);
    }

    pub fn bool_param(&self, name: &str, default: bool) -> bool {
        *self.bool_params.get(name).unwrap_or(&default)
    }

    pub fn set_string_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.string_params.insert(name.into(), value.into());
    }

    pub fn string_param(&self, name: &str, default: &str) -> String {
        self.string_params.get(name).cloned().unwrap_or_else(|| default.to_string())
    }

    pub fn set_vec3_param(&mut self, name: impl Into<String>, value: Vector3<f32>) {
        self.vec3_params.insert(name.into(), value);
    }

    pub fn vec3_param(&self, name: &str, default: Vector3<f32>) -> Vector3<f32> {
        *self.vec3_params.get(name).unwrap_or(&default)
    }

    /// Resets to defaults, then installs one of the nine named presets.
    /// Unknown names leave the parameters at their defaults and return
    /// `false` (logged by the caller).
    pub fn apply_preset(&mut self, preset_name: &str) -> bool {
        *self = Self::default();

        match preset_name {
            "default" => true,
            "flat" => {
                self.terrain_mode = TerrainMode::Flat;
                self.min_height = 0.0;
                self.max_height = 100.0;
                self.water_level = 50.0;
                true
            }
            "hills" => {
                self.terrain_mode = TerrainMode::HeightMap;
                self.min_height = 0.0;
                self.max_height = 128.0;
                self.water_level = 60.0;
                self.terrain_roughness = 0.3;
                self.terrain_erosion = 0.1;
                self.terrain_noise_layer = "terrain".to_string();
                true
            }
            "mountains" => {
                self.terrain_mode = TerrainMode::Mountains;
                self.min_height = 0.0;
                self.max_height = 196.0;
                self.water_level = 50.0;
                self.terrain_roughness = 0.7;
                self.terrain_erosion = 0.3;
                self.terrain_noise_layer = "terrain".to_string();
                self.set_bool_param("snow_caps", true);
                true
            }
            "islands" => {
                self.terrain_mode = TerrainMode::Islands;
                self.min_height = 10.0;
                self.max_height = 120.0;
                self.water_level = 60.0;
                self.water_enabled = true;
                self.terrain_roughness = 0.4;
                self.terrain_noise_layer = "terrain".to_string();
                true
            }
            "caves" => {
                self.terrain_mode = TerrainMode::Volumetric;
                self.min_height = 0.0;
                self.max_height = 128.0;
                self.water_level = 40.0;
                self.caves_enabled = true;
                self.cave_density = 0.6;
                self.cave_size = 1.5;
                self.terrain_noise_layer = "terrain".to_string();
                self.cave_noise_layer = "caves".to_string();
                true
            }
            "desert" => {
                self.terrain_mode = TerrainMode::Desert;
                self.min_height = 0.0;
                self.max_height = 100.0;
                self.water_level = 30.0;
                self.water_enabled = false;
                self.caves_enabled = false;
                self.terrain_roughness = 0.2;
                self.terrain_erosion = 0.05;
                self.terrain_noise_layer = "terrain".to_string();
                self.set_bool_param("use_dunes", true);
                self.set_float_param("dune_scale", 40.0);
                true
            }
            "archipelago" => {
                self.terrain_mode = TerrainMode::Islands;
                self.min_height = 0.0;
                self.max_height = 80.0;
                self.water_level = 50.0;
                self.water_enabled = true;
                self.terrain_roughness = 0.3;
                self.terrain_noise_layer = "terrain".to_string();
                self.set_float_param("island_density", 0.3);
                true
            }
            "jungle" => {
                self.terrain_mode = TerrainMode::HeightMap;
                self.min_height = 0.0;
                self.max_height = 160.0;
                self.water_level = 40.0;
                self.caves_enabled = true;
                self.cave_density = 0.3;
                self.terrain_roughness = 0.5;
                self.terrain_erosion = 0.2;
                self.terrain_noise_layer = "terrain".to_string();
                self.feature_density = 0.8;
                self.set_bool_param("dense_vegetation", true);
                true
            }
            "canyon" => {
                self.terrain_mode = TerrainMode::HeightMap;
                self.min_height = 0.0;
                self.max_height = 200.0;
                self.water_level = 20.0;
                self.terrain_roughness = 0.6;
                self.terrain_erosion = 0.8;
                self.terrain_noise_layer = "terrain".to_string();
                self.set_bool_param("use_canyons", true);
                self.set_float_param("canyon_depth", 100.0);
                self.set_float_param("canyon_width", 40.0);
                true
            }
            _ => false,
        }
    }

    pub fn write_object<W: std::io::Write + std::io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        let mut obj = w.begin_object("GenerationParameters")?;
        obj.write_field("terrain_mode", Tag::U8, |w| w.write_u8(self.terrain_mode.as_u8()))?;
        obj.write_field("min_height", Tag::F32, |w| w.write_f32(self.min_height))?;
        obj.write_field("max_height", Tag::F32, |w| w.write_f32(self.max_height))?;
        obj.write_field("water_level", Tag::F32, |w| w.write_f32(self.water_level))?;
        obj.write_field("water_enabled", Tag::Bool, |w| w.write_bool(self.water_enabled))?;
        obj.write_field("caves_enabled", Tag::Bool, |w| w.write_bool(self.caves_enabled))?;
        obj.write_field("cave_density", Tag::F32, |w| w.write_f32(self.cave_density))?;
        obj.write_field("cave_size", Tag::F32, |w| w.write_f32(self.cave_size))?;
        obj.write_field("terrain_noise_layer", Tag::String, |w| w.write_string(&self.terrain_noise_layer))?;
        obj.write_field("cave_noise_layer", Tag::String, |w| w.write_string(&self.cave_noise_layer))?;
        obj.write_field("feature_noise_layer", Tag::String, |w| w.write_string(&self.feature_noise_layer))?;
        obj.write_field("biome_noise_layer", Tag::String, |w| w.write_string(&self.biome_noise_layer))?;
        obj.write_field("terrain_roughness", Tag::F32, |w| w.write_f32(self.terrain_roughness))?;
        obj.write_field("terrain_erosion", Tag::F32, |w| w.write_f32(self.terrain_erosion))?;
        obj.write_field("feature_placement_pattern", Tag::U8, |w| w.write_u8(self.feature_placement_pattern.as_u8()))?;
        obj.write_field("feature_density", Tag::F32, |w| w.write_f32(self.feature_density))?;
        obj.write_field("biome_blend_distance", Tag::F32, |w| w.write_f32(self.biome_blend_distance))?;
        obj.write_field("feature_placement_control", Tag::String, |w| w.write_string(&self.feature_placement_control))?;
        obj.write_field("distribution_control", Tag::String, |w| w.write_string(&self.distribution_control))?;

        write_bool_map(&mut obj, "enabled_feature_types", &self.enabled_feature_types)?;
        write_f32_map(&mut obj, "feature_type_densities", &self.feature_type_densities)?;
        write_f32_map(&mut obj, "float_params", &self.float_params)?;
        write_i32_map(&mut obj, "int_params", &self.int_params)?;
        write_bool_map(&mut obj, "bool_params", &self.bool_params)?;
        write_string_map(&mut obj, "string_params", &self.string_params)?;
        write_vec3_map(&mut obj, "vec3_params", &self.vec3_params)?;

        obj.end()
    }

    pub fn read_object<R: std::io::Read + std::io::Seek>(r: &mut Reader<R>) -> Result<Self> {
        let mut obj = r.begin_object("GenerationParameters")?;
        let terrain_mode = TerrainMode::from_u8(obj.read_field("terrain_mode", Tag::U8, |r, _| r.read_u8())?);
        let min_height = obj.read_field("min_height", Tag::F32, |r, _| r.read_f32())?;
        let max_height = obj.read_field("max_height", Tag::F32, |r, _| r.read_f32())?;
        let water_level = obj.read_field("water_level", Tag::F32, |r, _| r.read_f32())?;
        let water_enabled = obj.read_field("water_enabled", Tag::Bool, |r, _| r.read_bool())?;
        let caves_enabled = obj.read_field("caves_enabled", Tag::Bool, |r, _| r.read_bool())?;
        let cave_density = obj.read_field("cave_density", Tag::F32, |r, _| r.read_f32())?;
        let cave_size = obj.read_field("cave_size", Tag::F32, |r, _| r.read_f32())?;
        let terrain_noise_layer = obj.read_field("terrain_noise_layer", Tag::String, |r, _| r.read_string())?;
        let cave_noise_layer = obj.read_field("cave_noise_layer", Tag::String, |r, _| r.read_string())?;
        let feature_noise_layer = obj.read_field("feature_noise_layer", Tag::String, |r, _| r.read_string())?;
        let biome_noise_layer = obj.read_field("biome_noise_layer", Tag::String, |r, _| r.read_string())?;
        let terrain_roughness = obj.read_field("terrain_roughness", Tag::F32, |r, _| r.read_f32())?;
        let terrain_erosion = obj.read_field("terrain_erosion", Tag::F32, |r, _| r.read_f32())?;
        let feature_placement_pattern = PlacementPattern::from_u8(obj.read_field("feature_placement_pattern", Tag::U8, |r, _| r.read_u8())?);
        let feature_density = obj.read_field("feature_density", Tag::F32, |r, _| r.read_f32())?;
        let biome_blend_distance = obj.read_field("biome_blend_distance", Tag::F32, |r, _| r.read_f32())?;
        let feature_placement_control = obj.read_field("feature_placement_control", Tag::String, |r, _| r.read_string())?;
        let distribution_control = obj.read_field("distribution_control", Tag::String, |r, _| r.read_string())?;

        let enabled_feature_types = read_bool_map(&mut obj, "enabled_feature_types")?;
        let feature_type_densities = read_f32_map(&mut obj, "feature_type_densities")?;
        let float_params = read_f32_map(&mut obj, "float_params")?;
        let int_params = read_i32_map(&mut obj, "int_params")?;
        let bool_params = read_bool_map(&mut obj, "bool_params")?;
        let string_params = read_string_map(&mut obj, "string_params")?;
        let vec3_params = read_vec3_map(&mut obj, "vec3_params")?;

        obj.end()?;

        Ok(GenerationParameters {
            terrain_mode,
            min_height,
            max_height,
            water_level,
            water_enabled,
            caves_enabled,
            cave_density,
            cave_size,
            terrain_noise_layer,
            cave_noise_layer,
            feature_noise_layer,
            biome_noise_layer,
            terrain_roughness,
            terrain_erosion,
            feature_placement_pattern,
            feature_density,
            biome_blend_distance,
            feature_placement_control,
            distribution_control,
            enabled_feature_types,
            feature_type_densities,
            float_params,
            int_params,
            bool_params,
            string_params,
            vec3_params,
        })
    }
}

fn write_f32_map<W: std::io::Write + std::io::Seek>(obj: &mut crate::codec::writer::ObjectWriter<W>, name: &'static str, map: &HashMap<String, f32>) -> Result<()> {
    obj.write_field(name, Tag::Array, |w| {
        let mut arr = w.begin_array_body(map.len(), Tag::Object)?;
        for (k, v) in map {
            arr.push(Tag::Object, |w| {
                let mut c = w.begin_object_body("KvF32")?;
                c.write_field("k", Tag::String, |w| w.write_string(k))?;
                c.write_field("v", Tag::F32, |w| w.write_f32(*v))?;
                c.end()
            })?;
        }
        arr.end()
    })
}

fn read_f32_map<R: std::io::Read + std::io::Seek>(obj: &mut crate::codec::reader::ObjectReader<R>, name: &'static str) -> Result<HashMap<String, f32>> {
    let mut map = HashMap::new();
    obj.read_field(name, Tag::Array, |r, _size| {
        let mut arr = r.begin_array_body()?;
        while let Some((k, v)) = arr.next(|r, _tag, _size| {
            let mut c = r.begin_object_body("KvF32")?;
            let k = c.read_field("k", Tag::String, |r, _| r.read_string())?;
            let v = c.read_field("v", Tag::F32, |r, _| r.read_f32())?;
            c.end()?;
            Ok((k, v))
        })? {
            map.insert(k, v);
        }
        arr.end()
    })?;
    Ok(map)
}

fn write_i32_map<W: std::io::Write + std::io::Seek>(obj: &mut crate::codec::writer::ObjectWriter<W>, name: &'static str, map: &HashMap<String, i32>) -> Result<()> {
    obj.write_field(name, Tag::Array, |w| {
        let mut arr = w.begin_array_body(map.len(), Tag::Object)?;
        for (k, v) in map {
            arr.push(Tag::Object, |w| {
                let mut c = w.begin_object_body("KvI32")?;
                c.write_field("k", Tag::String, |w| w.write_string(k))?;
                c.write_field("v", Tag::I32, |w| w.write_i32(*v))?;
                c.end()
            })?;
        }
        arr.end()
    })
}

fn read_i32_map<R: std::io::Read + std::io::Seek>(obj: &mut crate::codec::reader::ObjectReader<R>, name: &'static str) -> Result<HashMap<String, i32>> {
    let mut map = HashMap::new();
    obj.read_field(name, Tag::Array, |r, _size| {
        let mut arr = r.begin_array_body()?;
        while let Some((k, v)) = arr.next(|r, _tag, _size| {
            let mut c = r.begin_object_body("KvI32")?;
            let k = c.read_field("k", Tag::String, |r, _| r.read_string())?;
            let v = c.read_field("v", Tag::I32, |r, _| r.read_i32())?;
            c.end()?;
            Ok((k, v))
        })? {
            map.insert(k, v);
        }
        arr.end()
    })?;
    Ok(map)
}

fn write_bool_map<W: std::io::Write + std::io::Seek>(obj: &mut crate::codec::writer::ObjectWriter<W>, name: &'static str, map: &HashMap<String, bool>) -> Result<()> {
    obj.write_field(name, Tag::Array, |w| {
        let mut arr = w.begin_array_body(map.len(), Tag::Object)?;
        for (k, v) in map {
            arr.push(Tag::Object, |w| {
                let mut c = w.begin_object_body("KvBool")?;
                c.write_field("k", Tag::String, |w| w.write_string(k))?;
                c.write_field("v", Tag::Bool, |w| w.write_bool(*v))?;
                c.end()
            })?;
        }
        arr.end()
    })
}

fn read_bool_map<R: std::io::Read + std::io::Seek>(obj: &mut crate::codec::reader::ObjectReader<R>, name: &'static str) -> Result<HashMap<String, bool>> {
    let mut map = HashMap::new();
    obj.read_field(name, Tag::Array, |r, _size| {
        let mut arr = r.begin_array_body()?;
        while let Some((k, v)) = arr.next(|r, _tag, _size| {
            let mut c = r.begin_object_body("KvBool")?;
            let k = c.read_field("k", Tag::String, |r, _| r.read_string())?;
            let v = c.read_field("v", Tag::Bool, |r, _| r.read_bool())?;
            c.end()?;
            Ok((k, v))
        })? {
            map.insert(k, v);
        }
        arr.end()
    })?;
    Ok(map)
}

fn write_string_map<W: std::io::Write + std::io::Seek>(obj: &mut crate::codec::writer::ObjectWriter<W>, name: &'static str, map: &HashMap<String, String>) -> Result<()> {
    obj.write_field(name, Tag::Array, |w| {
        let mut arr = w.begin_array_body(map.len(), Tag::Object)?;
        for (k, v) in map {
            arr.push(Tag::Object, |w| {
                let mut c = w.begin_object_body("KvString")?;
                c.write_field("k", Tag::String, |w| w.write_string(k))?;
                c.write_field("v", Tag::String, |w| w.write_string(v))?;
                c.end()
            })?;
        }
        arr.end()
    })
}

fn read_string_map<R: std::io::Read + std::io::Seek>(obj: &mut crate::codec::reader::ObjectReader<R>, name: &'static str) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    obj.read_field(name, Tag::Array, |r, _size| {
        let mut arr = r.begin_array_body()?;
        while let Some((k, v)) = arr.next(|r, _tag, _size| {
            let mut c = r.begin_object_body("KvString")?;
            let k = c.read_field("k", Tag::String, |r, _| r.read_string())?;
            let v = c.read_field("v", Tag::String, |r, _| r.read_string())?;
            c.end()?;
            Ok((k, v))
        })? {
            map.insert(k, v);
        }
        arr.end()
    })?;
    Ok(map)
}

fn write_vec3_map<W: std::io::Write + std::io::Seek>(obj: &mut crate::codec::writer::ObjectWriter<W>, name: &'static str, map: &HashMap<String, Vector3<f32>>) -> Result<()> {
    obj.write_field(name, Tag::Array, |w| {
        let mut arr = w.begin_array_body(map.len(), Tag::Object)?;
        for (k, v) in map {
            arr.push(Tag::Object, |w| {
                let mut c = w.begin_object_body("KvVec3")?;
                c.write_field("k", Tag::String, |w| w.write_string(k))?;
                c.write_field("x", Tag::F32, |w| w.write_f32(v.x))?;
                c.write_field("y", Tag::F32, |w| w.write_f32(v.y))?;
                c.write_field("z", Tag::F32, |w| w.write_f32(v.z))?;
                c.end()
            })?;
        }
        arr.end()
    })
}

fn read_vec3_map<R: std::io::Read + std::io::Seek>(obj: &mut crate::codec::reader::ObjectReader<R>, name: &'static str) -> Result<HashMap<String, Vector3<f32>>> {
    let mut map = HashMap::new();
    obj.read_field(name, Tag::Array, |r, _size| {
        let mut arr = r.begin_array_body()?;
        while let Some((k, v)) = arr.next(|r, _tag, _size| {
            let mut c = r.begin_object_body("KvVec3")?;
            let k = c.read_field("k", Tag::String, |r, _| r.read_string())?;
            let x = c.read_field("x", Tag::F32, |r, _| r.read_f32())?;
            let y = c.read_field("y", Tag::F32, |r, _| r.read_f32())?;
            let z = c.read_field("z", Tag::F32, |r, _| r.read_f32())?;
            c.end()?;
            Ok((k, Vector3::new(x, y, z)))
        })? {
            map.insert(k, v);
        }
        arr.end()
    })?;
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_original_defaults() {
        let params = GenerationParameters::new();
        assert_eq!(params.terrain_mode(), TerrainMode::HeightMap);
        assert_eq!(params.max_height(), 100.0);
        assert_eq!(params.water_level(), 50.0);
    }

    #[test]
    fn mountains_preset_sets_snow_caps() {
        let mut params = GenerationParameters::new();
        assert!(params.apply_preset("mountains"));
        assert_eq!(params.terrain_mode(), TerrainMode::Mountains);
        assert_eq!(params.max_height(), 196.0);
        assert!(params.bool_param("snow_caps", false));
    }

    #[test]
    fn unknown_preset_resets_to_default_and_reports_failure() {
        let mut params = GenerationParameters::new();
        params.set_water_level(5.0);
        assert!(!params.apply_preset("nonexistent"));
        assert_eq!(params.water_level(), 50.0);
    }

    #[test]
    fn feature_type_enabled_defaults_to_true() {
        let params = GenerationParameters::new();
        assert!(params.is_feature_type_enabled("tree"));
    }
}
