// Back-end:
//  - three-address code
//  - control-flow layout

pub mod ir;
pub mod translation;
