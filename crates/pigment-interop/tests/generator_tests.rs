//! Comprehensive tests for descriptor to interop-unit generation
//!
//! Tests cover:
//! - Foreign declarations (per-architecture modules, dedup, error carrier)
//! - Wrapper orchestration (dispatch, error protocol, cleanup, marshaling)
//! - Lifecycle members (construction, disposal dispatch, static disposal)
//! - Bridge factories
//! - Descriptor validation

use pigment_interop::{
    generate_unit, ClassDescriptor, CleanupDescriptor, Direction, GenerateError,
    MethodDescriptor, ParameterDescriptor, TypeKind, Visibility,
};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn class(name: &str) -> ClassDescriptor {
    ClassDescriptor {
        name: name.into(),
        namespace: "pigment".into(),
        visibility: Visibility::Public,
        interface: None,
        has_instance: true,
        has_dispose: true,
        has_static_dispose: false,
        bridge: false,
        raises_warnings: false,
        uses_quantum: false,
        uses_channels: false,
        methods: Vec::new(),
    }
}

fn method(name: &str) -> MethodDescriptor {
    MethodDescriptor {
        name: name.into(),
        entry_point: None,
        returns: TypeKind::Unit,
        nullable: false,
        parameters: Vec::new(),
        is_static: false,
        uses_instance: true,
        sets_instance: false,
        throws: false,
        cleanup: None,
        restricted: false,
    }
}

fn param(name: &str, kind: TypeKind) -> ParameterDescriptor {
    ParameterDescriptor {
        name: name.into(),
        kind,
        direction: Direction::In,
    }
}

fn out_param(name: &str, kind: TypeKind) -> ParameterDescriptor {
    ParameterDescriptor {
        name: name.into(),
        kind,
        direction: Direction::Out,
    }
}

fn usize_ty() -> TypeKind {
    TypeKind::Primitive { name: "usize".into() }
}

/// Token rendering is whitespace-noisy; strip it all so needles are stable.
fn generate_flat(descriptor: &ClassDescriptor) -> String {
    let unit = generate_unit(descriptor).expect("descriptor should generate");
    unit.source.chars().filter(|c| !c.is_whitespace()).collect()
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Minimal disposable class: `Box` with a fallible `resize(width, height)`.
fn box_class() -> ClassDescriptor {
    let mut descriptor = class("Box");
    let mut resize = method("resize");
    resize.throws = true;
    resize.parameters = vec![param("width", usize_ty()), param("height", usize_ty())];
    descriptor.methods.push(resize);
    descriptor
}

// =============================================================================
// FOREIGN DECLARATION TESTS
// =============================================================================

#[test]
fn test_each_architecture_gets_its_own_linked_module() {
    let flat = generate_flat(&box_class());
    for (arch, library) in [
        ("arm64", "pigment_native_arm64"),
        ("x64", "pigment_native_x64"),
        ("x86", "pigment_native_x86"),
    ] {
        let gate = format!(
            "#[cfg(any(feature=\"platform-{arch}\",feature=\"platform-any\"))]"
        );
        assert!(flat.contains(&gate), "missing gate for {arch}");
        assert_eq!(count(&flat, &format!("#[link(name=\"{library}\")]")), 1);
    }
}

#[test]
fn test_throwing_declarations_carry_one_trailing_error_carrier() {
    let flat = generate_flat(&box_class());
    // One declaration per architecture, each ending in the carrier.
    assert_eq!(
        count(
            &flat,
            "pub(crate)fnBox_Resize(instance:RawHandle,width:usize,height:usize,\
             exception:*mutRawExceptionHandle);"
        ),
        3
    );
}

#[test]
fn test_dispose_entry_point_is_declared_once_per_architecture() {
    let flat = generate_flat(&box_class());
    assert_eq!(count(&flat, "pub(crate)fnBox_Dispose(instance:RawHandle);"), 3);
}

#[test]
fn test_identically_named_overloads_collapse_to_one_declaration() {
    let mut descriptor = box_class();
    let mut percentage = method("resize_percentage");
    percentage.entry_point = Some("Resize".into());
    percentage.throws = true;
    percentage.parameters = vec![param("width", usize_ty()), param("height", usize_ty())];
    descriptor.methods.push(percentage);

    let flat = generate_flat(&descriptor);
    // Still one declaration per architecture.
    assert_eq!(count(&flat, "pub(crate)fnBox_Resize("), 3);
    // Both wrappers exist and both dispatch to the shared entry point.
    assert_eq!(count(&flat, "pubfnresize(&self"), 1);
    assert_eq!(count(&flat, "pubfnresize_percentage(&self"), 1);
    assert_eq!(count(&flat, "arm64::Box_Resize("), 2);
}

#[test]
fn test_restricted_operations_are_excluded_from_the_reduced_runtime() {
    let mut descriptor = class("Image");
    let mut method = method("read_async_hint");
    method.throws = true;
    method.restricted = true;
    descriptor.methods.push(method);

    let flat = generate_flat(&descriptor);
    // Three gated declarations plus the gated wrapper method.
    assert_eq!(count(&flat, "#[cfg(not(feature=\"reduced-runtime\"))]"), 4);
}

// =============================================================================
// DISPATCH TESTS
// =============================================================================

#[test]
fn test_dispose_has_three_mutually_exclusive_call_sites() {
    let flat = generate_flat(&box_class());
    for (arch, variant) in [("arm64", "Arm64"), ("x64", "X64"), ("x86", "X86")] {
        let site = format!(
            "#[cfg(any(feature=\"platform-{arch}\",feature=\"platform-any\"))]\
             Architecture::{variant}=>unsafe{{{arch}::Box_Dispose(instance)}},"
        );
        assert_eq!(count(&flat, &site), 1, "call site for {arch}");
    }
    // Exactly three call sites in total, each compiled only under its gate.
    assert_eq!(count(&flat, "::Box_Dispose(instance)}"), 3);
}

#[test]
fn test_architecture_is_resolved_through_the_runtime_value() {
    let flat = generate_flat(&box_class());
    // One dispatch in resize, one in release.
    assert_eq!(count(&flat, "matchruntime::architecture()"), 2);
    // Single-architecture builds keep the fallback arm instead of the
    // missing variants.
    assert_eq!(count(&flat, "#[cfg(not(feature=\"platform-any\"))]_=>unreachable!"), 2);
}

#[test]
fn test_wrapper_passes_instance_and_carrier_to_every_branch() {
    let flat = generate_flat(&box_class());
    for arch in ["arm64", "x64", "x86"] {
        let call = format!("{arch}::Box_Resize(self.instance(),width,height,&mutexception)");
        assert_eq!(count(&flat, &call), 1);
    }
}

// =============================================================================
// ERROR PROTOCOL TESTS
// =============================================================================

#[test]
fn test_throwing_operation_raises_classified_failure() {
    let flat = generate_flat(&box_class());
    assert!(flat.contains(
        "ifletSome(exception)=Exception::from_carrier(exception){\
         returnErr(exception.into_error());}"
    ));
    // No cleanup routine is declared, so no partial-result release.
    assert!(!flat.contains("if!result.is_null(){Self::"));
}

#[test]
fn test_cleanup_runs_once_before_the_raise_and_only_with_a_result() {
    let mut descriptor = class("Image");
    let mut clone_area = method("clone_area");
    clone_area.sets_instance = true;
    clone_area.throws = true;
    clone_area.cleanup = Some(CleanupDescriptor {
        routine: Some("dispose_raw".into()),
        arguments: Vec::new(),
    });
    descriptor.has_static_dispose = true;
    descriptor.methods.push(clone_area);

    let flat = generate_flat(&descriptor);
    let protocol = "ifexception.is_fatal(){\
                    if!result.is_null(){Self::dispose_raw(result);}\
                    returnErr(exception.into_error());}";
    assert_eq!(count(&flat, protocol), 1);
}

#[test]
fn test_cleanup_extra_arguments_are_appended_after_the_result() {
    let mut descriptor = class("Image");
    let mut read = method("read_frames");
    read.sets_instance = true;
    read.throws = true;
    read.cleanup = Some(CleanupDescriptor {
        routine: Some("dispose_frames".into()),
        arguments: vec!["self.instance()".into()],
    });
    descriptor.methods.push(read);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("Self::dispose_frames(result,self.instance());"));
}

#[test]
fn test_non_fatal_classification_routes_to_the_warning_channel() {
    let mut descriptor = class("Image");
    descriptor.raises_warnings = true;
    let mut resize = method("resize");
    resize.throws = true;
    descriptor.methods.push(resize);
    let mut ping = method("ping");
    ping.is_static = true;
    ping.uses_instance = false;
    ping.throws = true;
    descriptor.methods.push(ping);

    let flat = generate_flat(&descriptor);
    // The instance operation warns instead of raising on non-fatal.
    assert_eq!(count(&flat, "self.warnings.notify(exception);"), 1);
    assert!(flat.contains("warnings:WarningChannel,"));
    assert!(flat.contains("pubfnon_warning(&self"));
    // The static operation raises on any reported error.
    assert!(flat.contains(
        "pubfnping()->Result<(),PigmentError>{runtime::ensure_initialized();"
    ));
}

// =============================================================================
// MARSHALING TESTS
// =============================================================================

#[test]
fn test_scoped_native_representations_guard_the_call() {
    let mut descriptor = class("Image");
    let mut draw = method("draw");
    draw.throws = true;
    draw.parameters = vec![param(
        "settings",
        TypeKind::Instance {
            class: "DrawSettings".into(),
            create: true,
            lookup: false,
        },
    )];
    descriptor.methods.push(draw);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains(
        "letsettings_native=native_draw_settings::NativeDrawSettings::to_scoped(settings)?;"
    ));
    assert!(flat.contains("settings_native.get()"));
}

#[test]
fn test_output_instances_convert_back_after_the_call() {
    let mut descriptor = class("Image");
    let mut page = method("page");
    page.throws = true;
    page.parameters = vec![out_param(
        "offset",
        TypeKind::Instance {
            class: "Point".into(),
            create: true,
            lookup: false,
        },
    )];
    descriptor.methods.push(page);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("letoffset_native=native_point::NativePoint::new_scoped()?;"));
    assert!(flat.contains("*offset=native_point::NativePoint::from_scoped(&offset_native);"));
}

#[test]
fn test_lookup_parameters_pass_the_existing_handle() {
    let mut descriptor = class("Image");
    let mut compose = method("compose");
    compose.parameters = vec![param(
        "other",
        TypeKind::Instance {
            class: "Image".into(),
            create: false,
            lookup: true,
        },
    )];
    descriptor.methods.push(compose);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("native_image::NativeImage::get_handle(other)"));
}

#[test]
fn test_fixed_buffers_are_pinned_for_the_call() {
    let mut descriptor = class("Image");
    let mut histogram = method("distort");
    histogram.parameters = vec![param(
        "arguments",
        TypeKind::FixedBuffer { element: "f64".into() },
    )];
    descriptor.methods.push(histogram);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("letarguments_ptr=arguments.as_ptr();"));
    assert!(flat.contains("arguments:*constf64"));
}

#[test]
fn test_enums_and_channels_pass_their_raw_encodings() {
    let mut descriptor = class("Image");
    descriptor.uses_channels = true;
    let mut interpolate = method("interpolate_mode");
    interpolate.returns = TypeKind::Enum { name: "PixelInterpolate".into() };
    interpolate.parameters = vec![
        param("mode", TypeKind::Enum { name: "PixelInterpolate".into() }),
        param("channels", TypeKind::ChannelSet),
    ];
    descriptor.methods.push(interpolate);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("modeasusize"));
    assert!(flat.contains("channels.to_raw()asRawChannels"));
    assert!(flat.contains("PixelInterpolate::from_raw(result)"));
    assert!(flat.contains(
        "#[cfg(any(feature=\"platform-x86\",feature=\"platform-any\"))]typeRawChannels=u32;"
    ));
}

#[test]
fn test_quantum_alias_follows_the_build_selection() {
    let mut descriptor = class("PixelCollection");
    descriptor.uses_quantum = true;
    let mut get = method("get_pixel");
    get.returns = TypeKind::Primitive { name: "Quantum".into() };
    descriptor.methods.push(get);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("#[cfg(feature=\"quantum-8\")]typeQuantum=u8;"));
    assert!(flat.contains("#[cfg(feature=\"quantum-16\")]typeQuantum=u16;"));
    assert!(flat.contains("#[cfg(feature=\"quantum-16-hdri\")]typeQuantum=f32;"));
}

#[test]
fn test_text_parameters_and_returns_use_the_utf8_conventions() {
    let mut descriptor = class("Image");
    let mut annotate = method("annotate");
    annotate.throws = true;
    annotate.parameters = vec![param("label", TypeKind::Text)];
    descriptor.methods.push(annotate);

    let mut format = method("format_name");
    format.nullable = true;
    format.returns = TypeKind::Text;
    descriptor.methods.push(format);

    let mut server = method("server_info");
    server.throws = true;
    server.returns = TypeKind::Text;
    server.cleanup = Some(CleanupDescriptor { routine: None, arguments: Vec::new() });
    descriptor.methods.push(server);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("letlabel_text=ScopedText::new(label);"));
    assert!(flat.contains("label_text.as_ptr()"));
    assert!(flat.contains("->Option<String>"));
    assert!(flat.contains("Utf8Text::read_nullable(result)"));
    // The explicit cleanup convention releases the returned buffer.
    assert!(flat.contains(
        "letdecoded=Utf8Text::read(result);memory::relinquish(resultasRawHandle);Ok(decoded)"
    ));
}

// =============================================================================
// RESULT PRODUCTION TESTS
// =============================================================================

#[test]
fn test_sets_instance_updates_the_handle_only_when_non_null() {
    let mut descriptor = box_class();
    let mut resize_into = method("resize_into");
    resize_into.sets_instance = true;
    resize_into.throws = true;
    descriptor.methods.push(resize_into);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("if!result.is_null(){self.set_instance(result);}Ok(())"));
    assert!(flat.contains("pubfnresize_into(&mutself)"));
}

#[test]
fn test_null_result_for_own_class_return_is_an_invalid_operation() {
    let mut descriptor = class("Image");
    let mut clone = method("clone_image");
    clone.throws = true;
    clone.returns = TypeKind::Instance {
        class: "Image".into(),
        create: false,
        lookup: false,
    };
    descriptor.methods.push(clone);

    let flat = generate_flat(&descriptor);
    assert!(flat.contains(
        "ifresult.is_null(){returnErr(PigmentError::InvalidOperation);}Ok(Self::from_raw(result))"
    ));
}

// =============================================================================
// LIFECYCLE AND BRIDGE TESTS
// =============================================================================

#[test]
fn test_construction_stores_the_handle_behind_the_init_guard() {
    let flat = generate_flat(&box_class());
    assert!(flat.contains(
        "pubfnfrom_raw(instance:RawHandle)->Self{runtime::ensure_initialized();\
         Self{instance:HandleCell::new(instance),}}"
    ));
    assert!(flat.contains("fntype_name(&self)->&'staticstr{\"Box\"}"));
}

#[test]
fn test_static_dispose_reuses_the_release_dispatch() {
    let mut descriptor = box_class();
    descriptor.has_static_dispose = true;
    let flat = generate_flat(&descriptor);
    assert!(flat.contains(
        "pubfndispose_raw(instance:RawHandle){<SelfasNativeResource>::release(instance);}"
    ));
}

#[test]
fn test_bridge_factory_handles_absence_with_the_zero_sentinel() {
    let mut descriptor = class("DrawSettings");
    descriptor.bridge = true;
    descriptor.interface = Some("DrawSettingsLike".into());

    let flat = generate_flat(&descriptor);
    assert!(flat.contains("fnto_native(value:Option<&dynDrawSettingsLike>"));
    assert!(flat.contains("None=>Ok(ScopedInstance::zero()),"));
    // Public classes delegate to the class's own conversion routine.
    assert!(flat.contains("Some(value)=>DrawSettings::to_native_scoped(value),"));

    descriptor.visibility = Visibility::Crate;
    let flat = generate_flat(&descriptor);
    assert!(flat.contains("Some(value)=>value.to_native_scoped(),"));
    assert!(flat.contains("pub(crate)structNativeDrawSettings"));
}

// =============================================================================
// VALIDATION TESTS
// =============================================================================

#[test]
fn test_generation_rejects_invariant_violations() {
    let mut descriptor = class("Image");
    descriptor.has_instance = false;
    descriptor.has_dispose = false;
    let mut read = method("read");
    read.uses_instance = false;
    read.sets_instance = true;
    read.throws = true;
    descriptor.methods.push(read);

    assert!(matches!(
        generate_unit(&descriptor),
        Err(GenerateError::Descriptor(_))
    ));
}

#[test]
fn test_generation_rejects_unparsable_cleanup_arguments() {
    let mut descriptor = class("Image");
    let mut read = method("read");
    read.sets_instance = true;
    read.throws = true;
    read.cleanup = Some(CleanupDescriptor {
        routine: Some("dispose_raw".into()),
        arguments: vec!["not ) balanced".into()],
    });
    descriptor.methods.push(read);

    assert!(matches!(
        generate_unit(&descriptor),
        Err(GenerateError::BadCleanupArgument { .. })
    ));
}
