/*!
A library of abstract string domains for static program analysis.

The centerpiece is the Bricks domain: an abstract value that represents a
string as an ordered sequence of *bricks*, where each brick denotes between
`min` and `max` concatenated repetitions of a value drawn from a finite set
of literal alternatives. The domain supports the usual lattice operations
(join, meet, partial order, widening) together with a full set of transfer
functions for string operations (concatenation, insertion, substring and
removal, trimming, padding, containment and prefix/suffix predicates,
length and index queries).

The library is consumed by an analysis engine through the generic traits in
[`abstract_domain`]:
- [`abstract_domain::AbstractDomain`], [`abstract_domain::HasTop`] and
  [`abstract_domain::HasBottom`] describe the lattice surface of any domain.
- [`abstract_domain::StringDomain`] adds constant construction and the
  meet/partial-order surface shared by all string abstractions.
- [`abstract_domain::StringOperations`] is the transfer-function contract,
  parameterized by the engine's variable type so that predicates can carry
  refinement assumptions about program variables.

All index, length and repetition arithmetic inside the domains uses the
saturating [`index::IndexInt`] type and closed [`index::IndexInterval`]
ranges over it.

Every operation is a pure function from immutable inputs to a new immutable
result; no value is ever mutated in place. Abstract values of the Bricks
domain carry a pluggable normalization policy that bounds the growth of
brick sequences and performs widening during fixpoint iteration.
*/

pub mod abstract_domain;
pub mod index;

mod prelude {
    pub use anyhow::{anyhow, Error};
    pub use serde::{Deserialize, Serialize};
}
