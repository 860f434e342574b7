//! Path-addressed access
//!
//! - Expression: parsing of `a.b`, `a->b` and `ns:tag` paths
//! - Cache: LRU of parsed expressions shared between resolvers
//! - Resolver: node, attribute and typed value lookups
//! - Coerce: conversion of node text to scalars

pub mod cache;
pub mod coerce;
pub mod expression;
pub mod resolver;

pub use expression::{PathExpression, Segment};
pub use resolver::{Base, Lookup, OnMissing, PathResolver, ResolverSettings};
