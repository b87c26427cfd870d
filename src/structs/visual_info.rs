// MIT/Apache2 License

flat_struct! {
    /// `XVisualInfo`, as filled in by `XGetVisualInfo` and `XMatchVisualInfo`.
    VisualInfo(XVisualInfo) {
        visual => visual,
        visualid => num,
        screen => num,
        depth => num,
        class => num,
        red_mask => num,
        green_mask => num,
        blue_mask => num,
        colormap_size => num,
        bits_per_rgb => num,
    }
}
