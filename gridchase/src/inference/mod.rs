mod artifact;
mod errors;
mod mlp;
mod tabular;
mod traits;

pub use artifact::{FORMAT_VERSION, LoadedPolicy, PolicyArtifact, load_policy, save_policy};
pub use errors::InferenceError;
pub use mlp::{Activation, DenseLayer, MlpPolicy};
pub use tabular::TabularPolicy;
pub use traits::{Policy, Prediction};
