use std::num::NonZeroU32;

use crate::error::{Error, Result};
use crate::field::ScalarField;

/// How the field texture is filtered when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Always available.
    Nearest,
    /// Needs adapter-specific format features and a filterable `R32Float`.
    Linear,
}

impl Sampling {
    /// Picks `Linear` when the device can filter the field texture.
    pub fn supported(adapter: &wgpu::Adapter, device: &wgpu::Device) -> Self {
        let adapter_formats = device
            .features()
            .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);
        let filterable = adapter
            .get_texture_format_features(DisplayTexture::FORMAT)
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE);
        Self::from_support(adapter_formats, filterable)
    }

    pub fn from_support(adapter_formats: bool, filterable: bool) -> Self {
        if adapter_formats && filterable {
            Self::Linear
        } else {
            Self::Nearest
        }
    }

    fn filter_mode(self) -> wgpu::FilterMode {
        match self {
            Self::Nearest => wgpu::FilterMode::Nearest,
            Self::Linear => wgpu::FilterMode::Linear,
        }
    }

    fn sample_type(self) -> wgpu::TextureSampleType {
        wgpu::TextureSampleType::Float {
            filterable: self == Self::Linear,
        }
    }

    fn sampler_type(self) -> wgpu::SamplerBindingType {
        match self {
            Self::Nearest => wgpu::SamplerBindingType::NonFiltering,
            Self::Linear => wgpu::SamplerBindingType::Filtering,
        }
    }
}

/// Layout of bind group 0 (the field texture and its sampler), together with
/// the sampling it was built for.
pub struct TextureLayout {
    layout: wgpu::BindGroupLayout,
    sampling: Sampling,
}

impl TextureLayout {
    pub fn new(device: &wgpu::Device, sampling: Sampling) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Field Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: sampling.sample_type(),
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(sampling.sampler_type()),
                    count: None,
                },
            ],
        });
        Self { layout, sampling }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }
}

/// A single-channel float texture mirroring a [`ScalarField`].
pub struct DisplayTexture {
    texture: wgpu::Texture,
    size: wgpu::Extent3d,
    bind_group: wgpu::BindGroup,
}

impl DisplayTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

    fn new(device: &wgpu::Device, layout: &TextureLayout, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Field Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter = layout.sampling().filter_mode();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Field Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field Texture Bind Group"),
            layout: layout.layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Self {
            texture,
            size,
            bind_group,
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    fn write(&self, queue: &wgpu::Queue, cells: &[f32]) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(cells),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: NonZeroU32::new(self.size.width * 4),
                rows_per_image: NonZeroU32::new(self.size.height),
            },
            self.size,
        );
    }
}

/// A field together with the texture that displays it.
///
/// The texture is sized from the field when the pair is built and the field
/// cannot be resized or swapped out, so every upload matches the texture
/// exactly.
pub struct FieldDisplay {
    field: ScalarField,
    texture: DisplayTexture,
}

impl FieldDisplay {
    pub fn new(
        device: &wgpu::Device,
        layout: &TextureLayout,
        field: ScalarField,
    ) -> Result<Self> {
        let max = device.limits().max_texture_dimension_2d;
        let too_large = || {
            Error::GraphicsContextInit(format!(
                "{}x{} field exceeds the device texture limit of {max}",
                field.width(),
                field.height()
            ))
        };
        let width = u32::try_from(field.width()).map_err(|_| too_large())?;
        let height = u32::try_from(field.height()).map_err(|_| too_large())?;
        if width > max || height > max {
            return Err(too_large());
        }

        let texture = DisplayTexture::new(device, layout, width, height);
        Ok(Self { field, texture })
    }

    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ScalarField {
        &mut self.field
    }

    pub fn texture(&self) -> &DisplayTexture {
        &self.texture
    }

    /// Overwrites the whole texture with the current field contents.
    pub fn upload(&self, queue: &wgpu::Queue) {
        self.texture.write(queue, self.field.as_slice());
    }

    /// Releases the GPU texture. The display must not be used afterwards.
    pub fn destroy(&self) {
        self.texture.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::seed::{seed, Droplet};
    use crate::testing::{headless_device, read_texture};

    #[test]
    fn linear_sampling_needs_both_supports() {
        assert_eq!(Sampling::from_support(true, true), Sampling::Linear);
        assert_eq!(Sampling::from_support(true, false), Sampling::Nearest);
        assert_eq!(Sampling::from_support(false, true), Sampling::Nearest);
        assert_eq!(Sampling::from_support(false, false), Sampling::Nearest);
    }

    #[test]
    fn sampling_maps_to_matching_bindings() {
        assert_eq!(Sampling::Linear.filter_mode(), wgpu::FilterMode::Linear);
        assert_eq!(
            Sampling::Linear.sampler_type(),
            wgpu::SamplerBindingType::Filtering
        );
        assert_eq!(
            Sampling::Linear.sample_type(),
            wgpu::TextureSampleType::Float { filterable: true }
        );

        assert_eq!(Sampling::Nearest.filter_mode(), wgpu::FilterMode::Nearest);
        assert_eq!(
            Sampling::Nearest.sampler_type(),
            wgpu::SamplerBindingType::NonFiltering
        );
        assert_eq!(
            Sampling::Nearest.sample_type(),
            wgpu::TextureSampleType::Float { filterable: false }
        );
    }

    #[test]
    fn sampling_falls_back_without_the_feature() {
        let Some((adapter, device, _queue)) = headless_device() else {
            eprintln!("No GPU adapter available, skipping sampling test");
            return;
        };
        // The test device is created without optional features.
        assert_eq!(Sampling::supported(&adapter, &device), Sampling::Nearest);
    }

    #[test]
    fn upload_round_trips_exactly() {
        let Some((_adapter, device, queue)) = headless_device() else {
            eprintln!("No GPU adapter available, skipping round-trip test");
            return;
        };

        let mut field = ScalarField::new(100, 60).unwrap();
        seed(&mut field, &[Droplet::new(30, 40)], 100);
        field[(0, 0)] = 0.125;
        field[(59, 99)] = -7.75;
        field[(12, 3)] = f32::MIN_POSITIVE;

        let layout = TextureLayout::new(&device, Sampling::Nearest);
        let display = FieldDisplay::new(&device, &layout, field.clone()).unwrap();
        display.upload(&queue);

        let texture = display.texture();
        let bytes = read_texture(&device, &queue, &texture.texture, texture.size, 4);
        let pixels: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(pixels.len(), field.as_slice().len());
        assert_eq!(pixels, field.as_slice());
    }

    #[test]
    fn oversized_fields_are_rejected() {
        let Some((_adapter, device, _queue)) = headless_device() else {
            eprintln!("No GPU adapter available, skipping texture limit test");
            return;
        };

        let max = device.limits().max_texture_dimension_2d as usize;
        let layout = TextureLayout::new(&device, Sampling::Nearest);
        let field = ScalarField::new(max + 1, 1).unwrap();
        let err = FieldDisplay::new(&device, &layout, field).err().unwrap();
        assert!(err.is_fatal());
    }
}
