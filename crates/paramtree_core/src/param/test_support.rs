use std::sync::Arc;

use crate::param::desc::{ClassInfo, DefaultDesc, FieldDesc, HintDesc, HintValue, TypeDesc, class_version};
use crate::param::{ArraySize, ClassDescriptor, HeapTraits, ParamType, Registry, Traits, TrackingTraits};

const BYTES_FIELDS: &[FieldDesc] = &[FieldDesc {
	name: "bytes",
	ty: TypeDesc::Array {
		size: ArraySize::Dynamic,
		element: &TypeDesc::Scalar(ParamType::U8),
	},
	..FieldDesc::BASE
}];

pub(crate) static BYTES: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "ByteStream",
	version: class_version(1, 0),
	checksum: [1, 2, 3, 4],
	alignment: 8,
	fields: BYTES_FIELDS,
});

const NOTE_FIELDS: &[FieldDesc] = &[FieldDesc {
	name: "text",
	ty: TypeDesc::String,
	..FieldDesc::BASE
}];

pub(crate) static NOTE: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "Note",
	version: class_version(1, 0),
	checksum: [5, 6, 7, 8],
	alignment: 8,
	fields: NOTE_FIELDS,
});

const OTHER_FIELDS: &[FieldDesc] = &[FieldDesc {
	name: "value",
	ty: TypeDesc::Scalar(ParamType::U32),
	..FieldDesc::BASE
}];

pub(crate) static OTHER: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "Other",
	version: class_version(1, 0),
	checksum: [9, 10, 11, 12],
	alignment: 4,
	fields: OTHER_FIELDS,
});

const NOTE_REF: TypeDesc = TypeDesc::Ref { variants: &["Note"] };

const HOLDER_FIELDS: &[FieldDesc] = &[
	FieldDesc {
		name: "children",
		ty: TypeDesc::Array {
			size: ArraySize::Dynamic,
			element: &NOTE_REF,
		},
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "single",
		ty: NOTE_REF,
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "any",
		ty: TypeDesc::Ref { variants: &[] },
		..FieldDesc::BASE
	},
];

pub(crate) static HOLDER: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "Holder",
	version: class_version(1, 0),
	checksum: [13, 14, 15, 16],
	alignment: 8,
	fields: HOLDER_FIELDS,
});

const POINT_FIELDS: &[FieldDesc] = &[
	FieldDesc {
		name: "x",
		ty: TypeDesc::Scalar(ParamType::F32),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "tag",
		ty: TypeDesc::Scalar(ParamType::U8),
		..FieldDesc::BASE
	},
];

const SETTINGS_FIELDS: &[FieldDesc] = &[
	FieldDesc {
		name: "scale",
		ty: TypeDesc::Scalar(ParamType::F64),
		default: Some(DefaultDesc::Float(2.5)),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "mode",
		ty: TypeDesc::Scalar(ParamType::I32),
		default: Some(DefaultDesc::Int(-3)),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "name",
		ty: TypeDesc::String,
		default: Some(DefaultDesc::Str("unnamed")),
		..FieldDesc::BASE
	},
];

const GRID_ROW: TypeDesc = TypeDesc::Array {
	size: ArraySize::Dynamic,
	element: &TypeDesc::Scalar(ParamType::U8),
};

const LAYOUT_FIELDS: &[FieldDesc] = &[
	FieldDesc {
		name: "flag",
		ty: TypeDesc::Scalar(ParamType::Bool),
		default: Some(DefaultDesc::Bool(true)),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "count",
		ty: TypeDesc::Scalar(ParamType::U32),
		default: Some(DefaultDesc::UInt(7)),
		hints: &[HintDesc {
			name: "max",
			value: HintValue::U64(100),
		}],
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "pos",
		ty: TypeDesc::Scalar(ParamType::Vec3),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "pair",
		ty: TypeDesc::Array {
			size: ArraySize::Fixed(2),
			element: &TypeDesc::Scalar(ParamType::U16),
		},
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "label",
		ty: TypeDesc::String,
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "points",
		ty: TypeDesc::Array {
			size: ArraySize::Dynamic,
			element: &TypeDesc::Struct { fields: POINT_FIELDS },
		},
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "grid",
		ty: TypeDesc::Array {
			size: ArraySize::Dynamic,
			element: &GRID_ROW,
		},
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "settings",
		ty: TypeDesc::Struct { fields: SETTINGS_FIELDS },
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "hidden",
		ty: TypeDesc::Scalar(ParamType::U64),
		included: false,
		..FieldDesc::BASE
	},
];

pub(crate) static LAYOUT: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "Layout",
	version: class_version(2, 1),
	checksum: [0xdead_beef, 0, 0, 1],
	alignment: 8,
	fields: LAYOUT_FIELDS,
});

pub(crate) fn heap() -> Arc<dyn Traits> {
	Arc::new(HeapTraits)
}

/// Tracker for instance memory; schemas of `classes` are built on the heap first so they
/// never count as outstanding.
pub(crate) fn tracking(classes: &[&ClassDescriptor]) -> (Arc<TrackingTraits>, Arc<dyn Traits>) {
	let heap = heap();
	for class in classes {
		class.definition_tree(&heap);
	}
	let tracker = Arc::new(TrackingTraits::new());
	let traits: Arc<dyn Traits> = tracker.clone();
	(tracker, traits)
}

pub(crate) fn test_registry() -> Registry {
	let mut registry = Registry::new();
	for class in [&BYTES, &NOTE, &OTHER, &HOLDER, &LAYOUT] {
		registry.register(class);
	}
	registry
}
