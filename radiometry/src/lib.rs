/// RGB colour type shared by materials and the shadow-transmittance kernel.
pub mod color;
