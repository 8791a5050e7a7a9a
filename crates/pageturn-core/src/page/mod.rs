mod container;
mod router;
mod source;
mod surface;

pub use container::{Container, ContainerId, Element, TriggerDecl};
pub use router::{LinkResolver, LinkTarget};
pub use source::{ConfigContainerSource, ContainerSource};
pub use surface::{MemorySurface, MountedContainer, PageSurface, SurfaceOp};
