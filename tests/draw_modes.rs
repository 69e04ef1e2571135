use animblit::{
    Blitter, BlitterMode, BlitterParams, BlitterSettings, Colour, EncodedSprite, Palette,
    RemapTable, Screen, SourcePixel, SourceSprite, SpriteCollection, SpriteEncoder, ZoomLevel,
    brightness, colour::compose_pa, make_dark, make_transparent, realize_blended,
};

fn sprite(w: u32, h: u32, f: impl Fn(u32, u32) -> SourcePixel) -> EncodedSprite {
    let pixels = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .map(|(x, y)| f(x, y))
        .collect();
    SpriteEncoder::new()
        .encode(&SpriteCollection::single(
            ZoomLevel::Normal,
            SourceSprite::new(w, h, pixels).unwrap(),
        ))
        .unwrap()
}

/// Opaque sprite mixing literal colours with remapped pixels.
fn mixed(x: u32, y: u32) -> SourcePixel {
    if (x + y) % 3 == 0 {
        let v = 40 + (x * 10) as u8;
        SourcePixel::remapped(10 + x as u8, v, v, v)
    } else {
        SourcePixel::rgba((x * 10) as u8 + 1, (y * 20) as u8 + 1, 7, 255)
    }
}

fn draw(
    screen: &mut Screen,
    settings: &BlitterSettings,
    sprite: &EncodedSprite,
    remap: &RemapTable,
    mode: BlitterMode,
    at: (usize, usize),
) {
    let palette = Palette::default();
    let blitter = Blitter::new(&palette, settings);
    let bp = BlitterParams::whole(sprite, ZoomLevel::Normal, at.0, at.1)
        .unwrap()
        .with_remap(remap);
    blitter.draw(screen, &bp, mode, ZoomLevel::Normal).unwrap();
}

#[test]
fn normal_draw_reproduces_opaque_sprite() {
    let spr = sprite(5, 4, mixed);
    let mut screen = Screen::new(12, 12).unwrap();
    draw(
        &mut screen,
        &BlitterSettings::default(),
        &spr,
        &RemapTable::identity(),
        BlitterMode::Normal,
        (2, 3),
    );

    let anim = screen.anim_buffer().unwrap();
    for y in 0..4u32 {
        for x in 0..5u32 {
            let p = mixed(x, y);
            let (sx, sy) = (2 + x as usize, 3 + y as usize);
            assert_eq!(screen.video().get(sx, sy), Colour::rgba(p.r, p.g, p.b, p.a));
            assert_eq!(anim.get(sx, sy), p.m, "index at ({x}, {y})");
        }
    }
    assert_eq!(screen.video().get(0, 0), Colour::BLACK);
    assert_eq!(screen.video().get(7, 3), Colour::BLACK);
}

#[test]
fn black_remap_blackens_covered_pixels_only() {
    let spr = sprite(4, 2, |x, _| match x {
        0 => SourcePixel::TRANSPARENT,
        1 => SourcePixel::rgba(50, 60, 70, 128),
        _ => SourcePixel::remapped(20, 90, 90, 90),
    });
    let mut screen = Screen::new(4, 2).unwrap();
    screen.clear(Colour::rgb(5, 5, 5));
    for y in 0..2 {
        for x in 0..4 {
            screen.anim_buffer_mut().unwrap().set(x, y, 9);
        }
    }

    draw(
        &mut screen,
        &BlitterSettings::default(),
        &spr,
        &RemapTable::identity(),
        BlitterMode::BlackRemap,
        (0, 0),
    );

    for y in 0..2 {
        assert_eq!(screen.video().get(0, y), Colour::rgb(5, 5, 5));
        assert_eq!(screen.anim_buffer().unwrap().get(0, y), 9);
        for x in 1..4 {
            assert_eq!(screen.video().get(x, y), Colour::BLACK);
            assert_eq!(screen.anim_buffer().unwrap().get(x, y), 0);
        }
    }
}

#[test]
fn clipped_draw_touches_exactly_the_destination_rect() {
    let cell = |x: u32, y: u32| SourcePixel::rgba((x * 20 + 1) as u8, (y * 20 + 1) as u8, 3, 255);
    let spr = sprite(10, 10, cell);
    let sentinel = Colour::rgb(200, 201, 202);
    let mut screen = Screen::new(10, 10).unwrap();
    screen.clear(sentinel);

    let palette = Palette::default();
    let settings = BlitterSettings::default();
    let blitter = Blitter::new(&palette, &settings);
    let bp = BlitterParams::whole(&spr, ZoomLevel::Normal, 4, 5)
        .unwrap()
        .with_clip(2, 1, 3, 2);
    blitter
        .draw(&mut screen, &bp, BlitterMode::Normal, ZoomLevel::Normal)
        .unwrap();

    for y in 0..10usize {
        for x in 0..10usize {
            let got = screen.video().get(x, y);
            if (4..7).contains(&x) && (5..7).contains(&y) {
                let p = cell((x - 4 + 2) as u32, (y - 5 + 1) as u32);
                assert_eq!(got, Colour::rgb(p.r, p.g, p.b), "({x}, {y})");
            } else {
                assert_eq!(got, sentinel, "({x}, {y}) must stay untouched");
            }
        }
    }
}

#[test]
fn clip_inside_a_transparent_run() {
    // Left half transparent: a clip starting inside it must still place the opaque
    // half at the right screen column.
    let spr = sprite(8, 1, |x, _| {
        if x < 4 {
            SourcePixel::TRANSPARENT
        } else {
            SourcePixel::rgba(x as u8, 0, 0, 255)
        }
    });
    let mut screen = Screen::new(8, 1).unwrap();
    let palette = Palette::default();
    let settings = BlitterSettings::default();
    let blitter = Blitter::new(&palette, &settings);
    let bp = BlitterParams::whole(&spr, ZoomLevel::Normal, 0, 0)
        .unwrap()
        .with_clip(2, 0, 5, 1);
    blitter
        .draw(&mut screen, &bp, BlitterMode::Normal, ZoomLevel::Normal)
        .unwrap();

    let row: Vec<u8> = screen.video().row(0).iter().map(|c| c.r).collect();
    assert_eq!(row, vec![0, 0, 4, 5, 6, 0, 0, 0]);
}

#[test]
fn transparent_remap_identity_keeps_animated_pixels() {
    let spr = sprite(5, 4, mixed);
    let shadow = sprite(5, 4, |_, _| SourcePixel::rgba(0, 0, 0, 255));
    let settings = BlitterSettings::default();
    let mut screen = Screen::new(5, 4).unwrap();
    draw(
        &mut screen,
        &settings,
        &spr,
        &RemapTable::identity(),
        BlitterMode::Normal,
        (0, 0),
    );
    let before = screen.clone();

    draw(
        &mut screen,
        &settings,
        &shadow,
        &RemapTable::identity(),
        BlitterMode::TransparentRemap,
        (0, 0),
    );

    let anim = screen.anim_buffer().unwrap();
    let old = before.anim_buffer().unwrap();
    let mut animated = 0;
    for y in 0..4 {
        for x in 0..5 {
            if old.get(x, y) != 0 {
                animated += 1;
                assert_eq!(anim.get(x, y), old.get(x, y));
                assert_eq!(screen.video().get(x, y), before.video().get(x, y));
            }
        }
    }
    assert!(animated > 0);
}

#[test]
fn transparent_remap_recolours_plain_pixels_through_nearest_index() {
    let palette = Palette::default();
    let start = palette.lookup(60);
    assert_eq!(palette.nearest_index(start), 60);

    let shadow = sprite(2, 1, |_, _| SourcePixel::rgba(0, 0, 0, 255));
    let remap = RemapTable::with_mapping(&[60, 230], &[120, 231]).unwrap();
    let animated_rgb = Colour::rgb(10, 200, 20);
    let mut screen = Screen::new(2, 1).unwrap();
    screen.video_mut().set(0, 0, start);
    screen.video_mut().set(1, 0, animated_rgb);
    screen.anim_buffer_mut().unwrap().set(1, 0, 230);

    draw(
        &mut screen,
        &BlitterSettings::default(),
        &shadow,
        &remap,
        BlitterMode::TransparentRemap,
        (0, 0),
    );

    let anim = screen.anim_buffer().unwrap();
    assert_eq!(screen.video().get(0, 0), palette.lookup(120));
    assert_eq!(anim.get(0, 0), 0);
    assert_eq!(screen.video().get(1, 0), animated_rgb);
    assert_eq!(anim.get(1, 0), 231);
}

#[test]
fn transparent_over_animated_pixel_darkens_its_brightness() {
    let spr = sprite(1, 1, |_, _| SourcePixel::rgba(0, 0, 0, 255));
    let dst = Colour::rgb(10, 200, 20);
    let mut screen = Screen::new(1, 1).unwrap();
    screen.video_mut().set(0, 0, dst);
    screen.anim_buffer_mut().unwrap().set(0, 0, 230);

    draw(
        &mut screen,
        &BlitterSettings::default(),
        &spr,
        &RemapTable::identity(),
        BlitterMode::Transparent,
        (0, 0),
    );

    let expected = make_transparent(Colour::rgb(brightness(dst), 0, 0), 3, 4);
    assert_eq!(expected, Colour::rgb(150, 0, 0));
    assert_eq!(screen.video().get(0, 0), expected);
    assert_eq!(screen.anim_buffer().unwrap().get(0, 0), 230);
}

#[test]
fn partial_alpha_remapped_pixels_blend_the_remapped_colour() {
    let spr = sprite(2, 1, |x, _| SourcePixel {
        r: 80,
        g: 80,
        b: 80,
        a: 128,
        m: if x == 0 { 5 } else { 6 },
    });
    let remap = RemapTable::with_mapping(&[5, 6], &[40, 0]).unwrap();
    let palette = Palette::default();
    let dst = Colour::rgb(10, 200, 20);

    for mode in [BlitterMode::ColourRemap, BlitterMode::CrashRemap] {
        let mut screen = Screen::new(2, 1).unwrap();
        screen.clear(dst);
        screen.anim_buffer_mut().unwrap().set(0, 0, 230);
        screen.anim_buffer_mut().unwrap().set(1, 0, 231);

        draw(
            &mut screen,
            &BlitterSettings::default(),
            &spr,
            &remap,
            mode,
            (0, 0),
        );

        let anim = screen.anim_buffer().unwrap();
        let below = realize_blended(&palette, 230, dst);
        assert_eq!(
            screen.video().get(0, 0),
            compose_pa(palette.lookup(40), 128, below),
            "{mode:?}"
        );
        assert_eq!(anim.get(0, 0), 0, "{mode:?}");
        // Remapped to 0: left alone, index included.
        assert_eq!(screen.video().get(1, 0), dst, "{mode:?}");
        assert_eq!(anim.get(1, 0), 231, "{mode:?}");
    }
}

#[test]
fn transparent_darkens_literal_pixels() {
    let spr = sprite(2, 1, |x, _| {
        if x == 0 {
            SourcePixel::rgba(0, 0, 0, 255)
        } else {
            SourcePixel::rgba(0, 0, 0, 128)
        }
    });
    let bg = Colour::rgb(200, 100, 40);
    let mut screen = Screen::new(2, 1).unwrap();
    screen.clear(bg);
    draw(
        &mut screen,
        &BlitterSettings::default(),
        &spr,
        &RemapTable::identity(),
        BlitterMode::Transparent,
        (0, 0),
    );

    assert_eq!(screen.video().get(0, 0), make_transparent(bg, 3, 4));
    assert_eq!(screen.video().get(1, 0), make_transparent(bg, 1024 - 128, 1024));
}

#[test]
fn colour_remap_and_crash_remap() {
    let spr = sprite(3, 1, |x, _| match x {
        0 => SourcePixel::rgba(200, 100, 50, 255),
        1 => SourcePixel::remapped(5, 80, 80, 80),
        _ => SourcePixel::remapped(6, 80, 80, 80),
    });
    let remap = RemapTable::with_mapping(&[5, 6], &[40, 0]).unwrap();
    let bg = Colour::rgb(9, 9, 9);

    for (mode, first) in [
        (BlitterMode::ColourRemap, Colour::rgb(200, 100, 50)),
        (BlitterMode::CrashRemap, make_dark(Colour::rgb(200, 100, 50))),
    ] {
        let mut screen = Screen::new(3, 1).unwrap();
        screen.clear(bg);
        draw(
            &mut screen,
            &BlitterSettings::default(),
            &spr,
            &remap,
            mode,
            (0, 0),
        );
        let anim = screen.anim_buffer().unwrap();
        assert_eq!(screen.video().get(0, 0), first, "{mode:?}");
        assert_eq!(anim.get(0, 0), 0);
        assert_eq!(screen.video().get(1, 0), Colour::rgb(80, 80, 80));
        assert_eq!(anim.get(1, 0), 40);
        assert_eq!(screen.video().get(2, 0), bg, "remap to 0 is not drawn");
        assert_eq!(anim.get(2, 0), 0);
    }
}

#[test]
fn partial_alpha_normal_clears_animation_index() {
    let spr = sprite(1, 1, |_, _| SourcePixel::rgba(255, 255, 255, 128));
    let mut screen = Screen::new(1, 1).unwrap();
    screen.anim_buffer_mut().unwrap().set(0, 0, 12);
    draw(
        &mut screen,
        &BlitterSettings::default(),
        &spr,
        &RemapTable::identity(),
        BlitterMode::Normal,
        (0, 0),
    );
    assert_eq!(screen.anim_buffer().unwrap().get(0, 0), 0);
}

#[test]
fn rgb_path_presents_like_the_animated_path() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let spr = sprite(6, 5, |x, y| {
        if x == 5 {
            SourcePixel::rgba(30, 60, 90, 100)
        } else {
            mixed(x, y)
        }
    });
    let remap = RemapTable::with_mapping(&[10, 13], &[240, 0]).unwrap();
    let palette = Palette::default();

    for mode in [
        BlitterMode::Normal,
        BlitterMode::ColourRemap,
        BlitterMode::CrashRemap,
        BlitterMode::BlackRemap,
    ] {
        let mut animated = Screen::new(8, 8).unwrap();
        draw(
            &mut animated,
            &BlitterSettings::default(),
            &spr,
            &remap,
            mode,
            (1, 2),
        );

        let mut flat = Screen::new(8, 8).unwrap();
        draw(
            &mut flat,
            &BlitterSettings { disable_anim: true },
            &spr,
            &remap,
            mode,
            (1, 2),
        );
        assert!(flat.anim_buffer().unwrap().as_slice().iter().all(|&m| m == 0));

        let offscreen_flat = {
            let mut s = Screen::offscreen(8, 8).unwrap();
            draw(
                &mut s,
                &BlitterSettings::default(),
                &spr,
                &remap,
                mode,
                (1, 2),
            );
            s
        };

        assert_eq!(animated.present(&palette), flat.present(&palette), "{mode:?}");
        assert_eq!(flat.present(&palette), offscreen_flat.present(&palette), "{mode:?}");
    }
}
