mod unit_class_schema {

	use std::sync::{Arc, Barrier};
	use std::thread;

	use crate::param::desc::{ClassInfo, FieldDesc, TypeDesc, class_version};
	use crate::param::test_support::{BYTES, heap, tracking};
	use crate::param::{Block, ClassDescriptor, ParamError, ParamType};

	const COUNTER_FIELDS: &[FieldDesc] = &[FieldDesc {
		name: "value",
		ty: TypeDesc::Scalar(ParamType::U32),
		..FieldDesc::BASE
	}];

	static CONCURRENT: ClassDescriptor = ClassDescriptor::new(ClassInfo {
		name: "Concurrent",
		version: class_version(1, 0),
		checksum: [0; 4],
		alignment: 4,
		fields: COUNTER_FIELDS,
	});

	static CYCLED: ClassDescriptor = ClassDescriptor::new(ClassInfo {
		name: "Cycled",
		version: class_version(1, 0),
		checksum: [0; 4],
		alignment: 4,
		fields: COUNTER_FIELDS,
	});

	#[test]
	fn concurrent_first_use_builds_once() {
		const THREADS: usize = 16;
		let barrier = Arc::new(Barrier::new(THREADS));
		let handles: Vec<_> = (0..THREADS)
			.map(|_| {
				let barrier = Arc::clone(&barrier);
				thread::spawn(move || {
					let traits = heap();
					barrier.wait();
					CONCURRENT.definition_tree(&traits)
				})
			})
			.collect();

		let schemas: Vec<_> = handles.into_iter().map(|handle| handle.join().expect("thread joins")).collect();
		assert_eq!(CONCURRENT.build_count(), 1);
		assert!(schemas.iter().all(|schema| Arc::ptr_eq(schema, &schemas[0])));
	}

	#[test]
	fn free_is_idempotent_and_allows_rebuild() {
		CYCLED.free_definition_tree();
		assert!(!CYCLED.is_built());
		assert_eq!(CYCLED.build_count(), 0);

		let (tracker, traits) = tracking(&[]);
		let schema = CYCLED.definition_tree(&traits);
		assert!(CYCLED.is_built());
		assert_eq!(tracker.outstanding(), 1);

		CYCLED.free_definition_tree();
		CYCLED.free_definition_tree();
		assert!(!CYCLED.is_built());
		assert!(CYCLED.schema().is_none());
		// The caller's Arc keeps the tree alive until dropped.
		assert_eq!(tracker.outstanding(), 1);
		drop(schema);
		assert_eq!(tracker.outstanding(), 0);

		CYCLED.definition_tree(&heap());
		assert_eq!(CYCLED.build_count(), 2);
	}

	#[test]
	fn create_in_place_rejects_misaligned_offset() {
		let (tracker, traits) = tracking(&[&BYTES]);
		let block = Arc::new(Block::alloc_zeroed(&traits, 64, 8).expect("block allocates"));

		// SAFETY: the block is zeroed, which is a valid empty layout, and no instance covers it.
		let err = unsafe { BYTES.create_in_place(Arc::clone(&traits), Arc::clone(&block), 4) }.expect_err("offset 4 is misaligned");
		assert!(matches!(err, ParamError::UnalignedBuffer { align: 8, .. }));
		assert!(
			tracker
				.events()
				.iter()
				.any(|event| matches!(event, crate::param::AllocEvent::Warn(message) if message.contains("Unaligned")))
		);

		// SAFETY: as above.
		let err = unsafe { BYTES.create_in_place(Arc::clone(&traits), Arc::clone(&block), 56) }.expect_err("region overruns block");
		assert!(matches!(err, ParamError::AllocationFailure { .. }));
	}

	#[test]
	fn in_place_instances_share_block_and_skip_initialization() {
		let (tracker, traits) = tracking(&[&BYTES]);
		let block = Arc::new(Block::alloc_zeroed(&traits, 64, 8).expect("block allocates"));

		// SAFETY: zeroed regions [0, 24) and [32, 56) are valid empty layouts and disjoint.
		let first = unsafe { BYTES.create_in_place(Arc::clone(&traits), Arc::clone(&block), 0) }.expect("first in place");
		// SAFETY: see above.
		let second = unsafe { BYTES.create_in_place(Arc::clone(&traits), Arc::clone(&block), 32) }.expect("second in place");
		drop(block);
		assert_eq!(first.ref_count(), 2);
		assert!(!first.is_self_allocated());

		let bytes = first.handle("bytes").expect("bytes handle");
		// Zeroed memory was taken as-is: the element size was never initialized.
		assert_eq!(first.array_info(&bytes).expect("array info").element_size, 0);

		drop(first);
		assert_eq!(second.ref_count(), 1);
		assert_eq!(tracker.outstanding(), 1);
		drop(second);
		assert_eq!(tracker.outstanding(), 0);
	}

	#[test]
	fn descriptor_exposes_layout_triple() {
		assert_eq!(BYTES.version(), 0x0001_0000);
		assert_eq!(BYTES.checksum_hex(), "00000001000000020000000300000004");
		assert_eq!(BYTES.alignment(), 8);
	}
}
