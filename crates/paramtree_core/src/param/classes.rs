//! Built-in asset class descriptions.

use crate::param::desc::{ClassInfo, DefaultDesc, FieldDesc, HintDesc, HintValue, TypeDesc, class_version};
use crate::param::{ArraySize, ClassDescriptor, ParamType};

const fn long(text: &'static str) -> HintDesc {
	HintDesc {
		name: "longDescription",
		value: HintValue::Str(text),
	}
}

const fn short(text: &'static str) -> HintDesc {
	HintDesc {
		name: "shortDescription",
		value: HintValue::Str(text),
	}
}

const INCLUDED: HintDesc = HintDesc {
	name: "INCLUDED",
	value: HintValue::U64(1),
};

const COLLISION_STREAM_FIELDS: &[FieldDesc] = &[FieldDesc {
	name: "bytes",
	ty: TypeDesc::Array {
		size: ArraySize::Dynamic,
		element: &TypeDesc::Scalar(ParamType::U8),
	},
	hints: &[
		long("A byte stream used to store cooked convex collision data. One is needed for every chunk at every scale which will be instanced."),
		short("A byte stream used to store cooked convex collision data"),
	],
	..FieldDesc::BASE
}];

/// Cooked convex collision data for one chunk at one scale.
pub static MESH_COOKED_COLLISION_STREAM: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "MeshCookedCollisionStream",
	version: class_version(0, 0),
	checksum: [0x6a0f3b1e, 0x2c7d55a4, 0x91e0c3d8, 0x0b4f27e6],
	alignment: 8,
	fields: COLLISION_STREAM_FIELDS,
});

const U16X3_FIELDS: &[FieldDesc] = &[
	FieldDesc {
		name: "x",
		ty: TypeDesc::Scalar(ParamType::U16),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "y",
		ty: TypeDesc::Scalar(ParamType::U16),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "z",
		ty: TypeDesc::Scalar(ParamType::U16),
		..FieldDesc::BASE
	},
];

const BUFFER_U16X3_FIELDS: &[FieldDesc] = &[FieldDesc {
	name: "data",
	ty: TypeDesc::Array {
		size: ArraySize::Dynamic,
		element: &TypeDesc::Struct { fields: U16X3_FIELDS },
	},
	hints: &[short("Container for BufferU16x3")],
	..FieldDesc::BASE
}];

/// Vertex buffer of `u16` triples.
pub static BUFFER_U16X3: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "BufferU16x3",
	version: class_version(0, 0),
	checksum: [0x904a928f, 0x9f3f0b91, 0x29168b39, 0x31638e80],
	alignment: 8,
	fields: BUFFER_U16X3_FIELDS,
});

const SUBMESH_FIELDS: &[FieldDesc] = &[
	FieldDesc {
		name: "name",
		ty: TypeDesc::String,
		hints: &[short("Submesh name")],
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "indexBuffer",
		ty: TypeDesc::Array {
			size: ArraySize::Dynamic,
			element: &TypeDesc::Scalar(ParamType::U32),
		},
		hints: &[short("Triangle list indices into the vertex buffer")],
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "vertexCount",
		ty: TypeDesc::Scalar(ParamType::U32),
		hints: &[short("Number of vertices referenced by the index buffer")],
		default: Some(DefaultDesc::UInt(0)),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "material",
		ty: TypeDesc::String,
		hints: &[short("Material name used to render this submesh")],
		..FieldDesc::BASE
	},
];

/// One draw-call group of a render mesh.
pub static SUBMESH_PARAMETERS: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "SubmeshParameters",
	version: class_version(0, 1),
	checksum: [0x3d9e1c42, 0x8b5a07f1, 0xe2c4916d, 0x5f08ab37],
	alignment: 8,
	fields: SUBMESH_FIELDS,
});

const SUBMESH_REF: TypeDesc = TypeDesc::Ref {
	variants: &["SubmeshParameters"],
};

const RENDER_MESH_FIELDS: &[FieldDesc] = &[
	FieldDesc {
		name: "submeshes",
		ty: TypeDesc::Array {
			size: ArraySize::Dynamic,
			element: &SUBMESH_REF,
		},
		hints: &[
			INCLUDED,
			long(
				"This is the array of submeshes which comprise the mesh. Triangles are grouped into submeshes, which correspond to a unique material name.",
			),
			short("Array of submeshes"),
		],
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "materialNames",
		ty: TypeDesc::Array {
			size: ArraySize::Dynamic,
			element: &TypeDesc::String,
		},
		hints: &[
			long("The material names which distinguish the submeshes (see submeshes)."),
			short("Array of material names"),
		],
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "partBounds",
		ty: TypeDesc::Array {
			size: ArraySize::Dynamic,
			element: &TypeDesc::Scalar(ParamType::Bounds3),
		},
		hints: &[
			long("Array of axis-aligned bounding boxes for each part. The bounds for part i are in partBounds[i]."),
			short("The AABBs of each mesh part"),
		],
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "textureUVOrigin",
		ty: TypeDesc::Scalar(ParamType::U32),
		hints: &[
			long("The texture origin convention to use for this mesh. See TextureUVOrigin."),
			short("Texture origin convention"),
		],
		default: Some(DefaultDesc::UInt(0)),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "boneCount",
		ty: TypeDesc::Scalar(ParamType::U32),
		hints: &[
			long("The number of mesh-skinning bones. For destructible assets, this is the same as the number of parts."),
			short("The number of mesh-skinning bones"),
		],
		default: Some(DefaultDesc::UInt(0)),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "deleteStaticBuffersAfterUse",
		ty: TypeDesc::Scalar(ParamType::Bool),
		hints: &[short("If set, static data buffers will be deleted after they are used in createRenderResources.")],
		default: Some(DefaultDesc::Bool(false)),
		..FieldDesc::BASE
	},
	FieldDesc {
		name: "isReferenced",
		ty: TypeDesc::Scalar(ParamType::Bool),
		hints: &[short("Is the render mesh asset referenced in other assets")],
		included: false,
		default: Some(DefaultDesc::Bool(false)),
		..FieldDesc::BASE
	},
];

/// Render mesh asset: submeshes, material names, and part bounds.
pub static RENDER_MESH_ASSET_PARAMETERS: ClassDescriptor = ClassDescriptor::new(ClassInfo {
	name: "RenderMeshAssetParameters",
	version: class_version(0, 0),
	checksum: [0xc1f5a0d2, 0x47be9e03, 0x7a3362f8, 0xd90e14bc],
	alignment: 8,
	fields: RENDER_MESH_FIELDS,
});

/// Every built-in class.
pub static BUILTIN: [&ClassDescriptor; 4] = [
	&MESH_COOKED_COLLISION_STREAM,
	&BUFFER_U16X3,
	&SUBMESH_PARAMETERS,
	&RENDER_MESH_ASSET_PARAMETERS,
];
