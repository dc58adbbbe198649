//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
extern crate cgmath;
extern crate rayon;
extern crate thiserror;

pub mod dispatch;
pub mod geometry;
pub mod volume;

pub use crate::geometry::*;
pub use crate::volume::*;
