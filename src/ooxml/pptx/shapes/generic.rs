/// Plain shapes, groups, connectors and tables.
///
/// Nothing is copied for the element itself. Whatever it references on the
/// way (hyperlinks, picture fills) is imported relationship by relationship.
use crate::ooxml::error::Result;
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::shapes::{Prepared, ShapeImporter, ShapeKind, import_references};
use crate::ooxml::xml::NodeId;

#[derive(Debug, Clone, Copy)]
pub struct GenericImporter {
    kind: ShapeKind,
}

impl GenericImporter {
    pub const GENERIC: GenericImporter = GenericImporter {
        kind: ShapeKind::Generic,
    };
    pub const TABLE: GenericImporter = GenericImporter {
        kind: ShapeKind::Table,
    };
}

impl ShapeImporter for GenericImporter {
    fn kind(&self) -> ShapeKind {
        self.kind
    }

    fn prepare(
        &self,
        ctx: &mut ImportContext<'_>,
        source: &SourcePart<'_>,
        target: &mut TargetPart,
        element: NodeId,
    ) -> Result<Prepared> {
        let mut prepared = Prepared::default();
        import_references(ctx, source, target, element, &mut prepared.rel_map)?;
        Ok(prepared)
    }
}
