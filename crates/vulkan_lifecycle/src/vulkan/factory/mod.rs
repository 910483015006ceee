//! Create/destroy pairs for every resource kind
//!
//! The factory performs the native calls and nothing else: it does not keep
//! what it creates. Every create either returns a fully initialized resource
//! or fails without leaving native objects behind; every destroy is a no-op on
//! a resource whose handle is already null.
//!
//! Operations are grouped by concern in the submodules; they all live on
//! [`Factory`].

mod buffer;
mod commands;
mod descriptor;
mod device;
mod instance;
mod pipeline;
mod presentation;
mod sync;

pub use pipeline::{shader_stage, SHADER_ENTRY_POINT};

use ash::vk::Handle;
use std::fmt;
use std::io;
use std::path::Path;

use super::driver::Driver;
use super::error::{ResultExt, VulkanError, VulkanResult};
use super::kind::ResourceKind;
use super::resource::{Resource, ResourceIds, Tracked};

/// Injected file loader, `path -> bytes`
pub type FileReader = Box<dyn Fn(&Path) -> io::Result<Vec<u8>>>;

/// Performs native create/destroy calls and hands out registry ids
pub struct Factory<D: Driver> {
    driver: D,
    ids: ResourceIds,
    read_file: FileReader,
}

impl<D: Driver> Factory<D> {
    /// Factory over `driver` reading shader files from disk
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            ids: ResourceIds::default(),
            read_file: Box::new(|path| std::fs::read(path)),
        }
    }

    /// Replace the file loader used for shader byte code
    #[must_use]
    pub fn with_file_reader(mut self, read_file: impl Fn(&Path) -> io::Result<Vec<u8>> + 'static) -> Self {
        self.read_file = Box::new(read_file);
        self
    }

    /// The underlying driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Wrap a freshly created handle, assigning its id only once the handle is known good.
    fn register<T: Handle + Copy, C>(
        &mut self,
        kind: ResourceKind,
        created: VulkanResult<T>,
        create_info: C,
    ) -> VulkanResult<Resource<T, C>> {
        let value = checked(kind, "create", created)?;
        Ok(Resource::new(self.ids.next(kind), kind, value, create_info))
    }

    /// Create several resources, undoing the ones already made if one fails.
    fn create_batch<I, R, F, G>(&mut self, infos: I, mut create: F, mut destroy: G) -> VulkanResult<Vec<R>>
    where
        I: IntoIterator,
        R: Tracked,
        F: FnMut(&mut Self, I::Item) -> VulkanResult<R>,
        G: FnMut(&mut Self, &mut R) -> VulkanResult<()>,
    {
        let mut created = Vec::new();
        for info in infos {
            match create(self, info) {
                Ok(resource) => created.push(resource),
                Err(error) => {
                    let count = created.len();
                    for resource in &mut created {
                        if let Err(cleanup) = destroy(self, resource) {
                            log::warn!(
                                "Failed to roll back {} #{}: {}",
                                resource.kind(),
                                resource.id(),
                                cleanup.report()
                            );
                        }
                    }
                    return Err(error.context(format!("batch create failed after {count} item(s)")));
                }
            }
        }
        Ok(created)
    }
}

impl<D: Driver> fmt::Debug for Factory<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory").field("ids", &self.ids).finish_non_exhaustive()
    }
}

/// Check a native result and reject null handles
fn checked<T: Handle + Copy>(kind: ResourceKind, operation: &'static str, created: VulkanResult<T>) -> VulkanResult<T> {
    let value = created.failed(operation, kind)?;
    if value.as_raw() == 0 {
        return Err(VulkanError::NullHandle { operation, kind });
    }
    Ok(value)
}

/// Destroy through `destroy` if the resource is live, then null it.
///
/// The handle is only nulled once the native call succeeded, so a failed
/// destroy can be retried.
fn destroy_with<T, C, F>(resource: &mut Resource<T, C>, destroy: F) -> VulkanResult<()>
where
    T: Handle + Copy,
    F: FnOnce(T) -> VulkanResult<()>,
{
    if !resource.is_live() {
        return Ok(());
    }
    destroy(resource.value).failed("destroy", resource.kind)?;
    resource.release();
    Ok(())
}
