//! Host-side wrapper around a module instance.

use sphereframe_common::{SphereError, SphereResult};
use sphereframe_frame_model::{FrameDesc, PixelBuffer};

use crate::module::{FrameModule, ModuleMetadata, Processed};
use crate::options::OptionValue;

/// Owns one module and tracks whether its last `create` succeeded.
///
/// `process` on a module that was never created, or whose last `create`
/// failed, is refused with [`SphereError::NotCreated`].
pub struct ModuleHost {
    module: Box<dyn FrameModule>,
    created: bool,
}

impl ModuleHost {
    pub fn new(module: Box<dyn FrameModule>) -> Self {
        Self {
            module,
            created: false,
        }
    }

    pub fn metadata(&self) -> ModuleMetadata {
        self.module.metadata()
    }

    pub fn module(&self) -> &dyn FrameModule {
        self.module.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn set_option(&mut self, name: &str, value: OptionValue) -> SphereResult<()> {
        self.module.set_option(name, value)
    }

    /// Apply a `name=value` assignment from the command line.
    pub fn set_option_str(&mut self, assignment: &str) -> SphereResult<()> {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            SphereError::configuration(format!("option '{assignment}' is not of the form name=value"))
        })?;
        self.module.options_mut().set_from_str(name.trim(), value)
    }

    /// Create the module, logging and returning the failure if any.
    pub fn try_create(&mut self, inputs: &[FrameDesc]) -> SphereResult<()> {
        let name = self.module.metadata().name;
        match self.module.create(inputs) {
            Ok(()) => {
                self.created = true;
                tracing::info!(
                    module = name,
                    output = ?self.module.output_desc(),
                    "Module created"
                );
                Ok(())
            }
            Err(err) => {
                self.created = false;
                tracing::warn!(module = name, error = %err, "Module create failed");
                Err(err)
            }
        }
    }

    /// Boolean view of [`ModuleHost::try_create`].
    pub fn create(&mut self, inputs: &[FrameDesc]) -> bool {
        self.try_create(inputs).is_ok()
    }

    pub fn output_desc(&self) -> Option<FrameDesc> {
        if self.created {
            self.module.output_desc()
        } else {
            None
        }
    }

    pub fn need_frame(&self) -> bool {
        self.module.need_frame()
    }

    pub fn process(&mut self, inputs: &[&PixelBuffer]) -> SphereResult<Processed<'_>> {
        if !self.created {
            return Err(SphereError::not_created(self.module.metadata().name));
        }
        self.module.process(inputs)
    }

    pub fn flush(&mut self) -> bool {
        let ok = self.module.flush();
        tracing::debug!(module = self.module.metadata().name, ok, "Module flushed");
        ok
    }

    pub fn destroy(&mut self) {
        self.module.destroy();
        self.created = false;
        tracing::debug!(module = self.module.metadata().name, "Module destroyed");
    }
}

impl Drop for ModuleHost {
    fn drop(&mut self) {
        if self.created {
            self.module.destroy();
        }
    }
}
