//! Shader modules, descriptor-set layouts and graphics pipelines

use ash::vk;
use std::ffi::CStr;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::{checked, destroy_with, Factory};
use crate::vulkan::create_info::{DescriptorSetLayoutCreateInfo, GraphicsPipelineCreateInfo, ShaderCreateInfo};
use crate::vulkan::driver::Driver;
use crate::vulkan::error::{ResultExt, VulkanError, VulkanResult};
use crate::vulkan::kind::ResourceKind;
use crate::vulkan::resource::{DescriptorSetLayout, Pipeline, Resource, Shader};

/// Entry point every shader stage is expected to export
pub const SHADER_ENTRY_POINT: &CStr = c"main";

/// Pipeline stage from the file name: `*.vert.spv` or `*.frag.spv`
pub fn shader_stage(path: &Path) -> VulkanResult<vk::ShaderStageFlags> {
    let name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
    if name.ends_with(".vert.spv") {
        Ok(vk::ShaderStageFlags::VERTEX)
    } else if name.ends_with(".frag.spv") {
        Ok(vk::ShaderStageFlags::FRAGMENT)
    } else {
        Err(VulkanError::InvalidArgument(format!(
            "cannot derive shader stage from {}, expected a .vert.spv or .frag.spv suffix",
            path.display()
        )))
    }
}

impl<D: Driver> Factory<D> {
    /// Create a shader module from a SPIR-V file.
    ///
    /// The stage comes from the file suffix and is checked before the file is
    /// read.
    pub fn create_shader(&mut self, device: vk::Device, path: &Path) -> VulkanResult<Shader> {
        let stage = shader_stage(path)?;
        let bytes = (self.read_file)(path).map_err(|source| VulkanError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let code = ash::util::read_spv(&mut Cursor::new(&bytes)).map_err(|error| {
            VulkanError::InvalidArgument(format!("{} is not SPIR-V: {error}", path.display()))
        })?;

        let info = ShaderCreateInfo {
            device,
            path: path.to_path_buf(),
            stage,
        };
        let native = vk::ShaderModuleCreateInfo::builder().code(&code);
        let created = self.driver.create_shader_module(device, &native);
        self.register(ResourceKind::ShaderModule, created, info)
    }

    /// Destroy a shader module
    pub fn destroy_shader(&mut self, shader: &mut Shader) -> VulkanResult<()> {
        let device = shader.create_info.device;
        let driver = &self.driver;
        destroy_with(shader, |handle| driver.destroy_shader_module(device, handle))
    }

    /// Create a descriptor-set layout
    pub fn create_descriptor_set_layout(
        &mut self,
        info: DescriptorSetLayoutCreateInfo,
    ) -> VulkanResult<DescriptorSetLayout> {
        let created = self
            .driver
            .create_descriptor_set_layout(info.device, &info.finalize());
        self.register(ResourceKind::DescriptorSetLayout, created, info)
    }

    /// Destroy a descriptor-set layout
    pub fn destroy_descriptor_set_layout(&mut self, layout: &mut DescriptorSetLayout) -> VulkanResult<()> {
        let device = layout.create_info.device;
        let driver = &self.driver;
        destroy_with(layout, |handle| driver.destroy_descriptor_set_layout(device, handle))
    }

    /// Create a graphics pipeline and its layout.
    ///
    /// Shader modules are created per distinct path and destroyed again as
    /// soon as the pipeline exists, whether or not pipeline creation worked.
    /// On failure the layout is destroyed too.
    pub fn create_graphics_pipeline(&mut self, info: GraphicsPipelineCreateInfo) -> VulkanResult<Pipeline> {
        let device = info.device;
        let layout = checked(
            ResourceKind::PipelineLayout,
            "create",
            self.driver.create_pipeline_layout(device, &info.layout_info()),
        )?;

        let mut shaders = Vec::new();
        let created = self
            .create_pipeline_shaders(device, &info.shader_paths, &mut shaders)
            .and_then(|()| checked(ResourceKind::Pipeline, "create", self.link_pipeline(&info, layout, &shaders)));

        for shader in &mut shaders {
            if let Err(error) = self.destroy_shader(shader) {
                log::warn!("Failed to destroy intermediate shader {}: {}", shader.create_info.path.display(), error.report());
            }
        }

        match created {
            Ok(pipeline) => Ok(Pipeline {
                resource: Resource::new(self.ids.next(ResourceKind::Pipeline), ResourceKind::Pipeline, pipeline, info),
                layout,
            }),
            Err(error) => {
                if let Err(cleanup) = self.driver.destroy_pipeline_layout(device, layout) {
                    log::warn!("Failed to destroy pipeline layout: {}", cleanup.report());
                }
                Err(error)
            }
        }
    }

    /// Destroy a pipeline and then its layout.
    pub fn destroy_pipeline(&mut self, pipeline: &mut Pipeline) -> VulkanResult<()> {
        let device = pipeline.create_info.device;
        let driver = &self.driver;
        destroy_with(&mut pipeline.resource, |handle| driver.destroy_pipeline(device, handle))?;

        if pipeline.layout != vk::PipelineLayout::null() {
            driver
                .destroy_pipeline_layout(device, pipeline.layout)
                .failed("destroy", ResourceKind::PipelineLayout)?;
            pipeline.layout = vk::PipelineLayout::null();
        }
        Ok(())
    }

    fn create_pipeline_shaders(
        &mut self,
        device: vk::Device,
        paths: &[PathBuf],
        shaders: &mut Vec<Shader>,
    ) -> VulkanResult<()> {
        for path in paths {
            if shaders.iter().any(|shader| shader.create_info.path == *path) {
                continue;
            }
            let shader = self
                .create_shader(device, path)
                .context(format!("compile {} for a graphics pipeline", path.display()))?;
            shaders.push(shader);
        }
        Ok(())
    }

    fn link_pipeline(
        &self,
        info: &GraphicsPipelineCreateInfo,
        layout: vk::PipelineLayout,
        shaders: &[Shader],
    ) -> VulkanResult<vk::Pipeline> {
        let stages: Vec<vk::PipelineShaderStageCreateInfo> = shaders
            .iter()
            .map(|shader| {
                vk::PipelineShaderStageCreateInfo::builder()
                    .stage(shader.create_info.stage)
                    .module(shader.value)
                    .name(SHADER_ENTRY_POINT)
                    .build()
            })
            .collect();

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&info.vertex_bindings)
            .vertex_attribute_descriptions(&info.vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(info.topology)
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: info.extent.width as f32,
            height: info.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: info.extent,
        }];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(info.cull_mode)
            .front_face(info.front_face)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(&color_blend_attachments);

        let mut native = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .color_blend_state(&color_blending)
            .layout(layout)
            .render_pass(info.render_pass)
            .subpass(info.subpass);
        if info.depth_test {
            native = native.depth_stencil_state(&depth_stencil);
        }

        self.driver.create_graphics_pipeline(info.device, &native)
    }
}
