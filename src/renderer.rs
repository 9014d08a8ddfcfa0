//! Renderer dependency — the surface the online/offline hooks touch.
//!
//! Only the main thread ever calls into this trait, always from inside
//! `bring_loaded_online`, `unload`, or `reload`.  The handles are opaque;
//! a real backend maps them to GL/Vulkan objects, the [`NullRenderer`]
//! just counts them for tests and headless tools.

/// Opaque handle to a renderer-side object (texture, shader, buffer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderHandle(pub u32);

/// Invalid/absent handle.
pub const INVALID_HANDLE: RenderHandle = RenderHandle(0);

/// Pixel layout of texture payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PixelFormat {
    R8 = 0,
    Rgb8 = 1,
    Rgba8 = 2,
}

impl PixelFormat {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(PixelFormat::R8),
            1 => Some(PixelFormat::Rgb8),
            2 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// What the resource codecs need from the renderer.
pub trait RendererOps: Send {
    fn create_texture(
        &mut self,
        format: PixelFormat,
        width: u16,
        height: u16,
        pixels: &[u8],
    ) -> RenderHandle;
    fn destroy_texture(&mut self, handle: RenderHandle);

    fn create_vertex_shader(&mut self, source: &str) -> RenderHandle;
    fn create_pixel_shader(&mut self, source: &str) -> RenderHandle;
    fn destroy_shader(&mut self, handle: RenderHandle);

    fn create_vertex_buffer(&mut self, vertices: &[f32]) -> RenderHandle;
    fn create_index_buffer(&mut self, indices: &[u16]) -> RenderHandle;
    fn destroy_buffer(&mut self, handle: RenderHandle);
}

/// Counts creations and destructions; never talks to a GPU.
#[derive(Default)]
pub struct NullRenderer {
    next: u32,
    pub textures_created: u32,
    pub textures_destroyed: u32,
    pub shaders_created: u32,
    pub shaders_destroyed: u32,
    pub buffers_created: u32,
    pub buffers_destroyed: u32,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self { next: 1, ..Self::default() }
    }

    fn next_handle(&mut self) -> RenderHandle {
        let h = RenderHandle(self.next);
        self.next += 1;
        h
    }

    /// True when every created object has been destroyed again.
    pub fn balanced(&self) -> bool {
        self.textures_created == self.textures_destroyed
            && self.shaders_created == self.shaders_destroyed
            && self.buffers_created == self.buffers_destroyed
    }
}

impl RendererOps for NullRenderer {
    fn create_texture(&mut self, _: PixelFormat, _: u16, _: u16, _: &[u8]) -> RenderHandle {
        self.textures_created += 1;
        self.next_handle()
    }

    fn destroy_texture(&mut self, _: RenderHandle) {
        self.textures_destroyed += 1;
    }

    fn create_vertex_shader(&mut self, _: &str) -> RenderHandle {
        self.shaders_created += 1;
        self.next_handle()
    }

    fn create_pixel_shader(&mut self, _: &str) -> RenderHandle {
        self.shaders_created += 1;
        self.next_handle()
    }

    fn destroy_shader(&mut self, _: RenderHandle) {
        self.shaders_destroyed += 1;
    }

    fn create_vertex_buffer(&mut self, _: &[f32]) -> RenderHandle {
        self.buffers_created += 1;
        self.next_handle()
    }

    fn create_index_buffer(&mut self, _: &[u16]) -> RenderHandle {
        self.buffers_created += 1;
        self.next_handle()
    }

    fn destroy_buffer(&mut self, _: RenderHandle) {
        self.buffers_destroyed += 1;
    }
}
