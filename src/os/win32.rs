//! equivalent to win32_handmade.cpp

use crate::clock::FrameClock;
use crate::common::{ButtonState, ControllerInput};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::Context;
use crate::input::{process_keyboard_message, GamepadState};
use crate::platform::{Display, InputDevice, NullSoundDevice, SoundDevice, StubInput};
use crate::sound::{PlayCursors, RingRegion, BYTES_PER_SAMPLE};
use crate::surface::PixelSurface;
use std::{
    ffi::OsStr,
    iter::once,
    mem::{size_of, transmute, zeroed},
    os::windows::ffi::OsStrExt,
    ptr::null_mut,
    slice,
};
use winapi::{
    ctypes::c_void,
    shared::{minwindef::*, mmreg::*, windef::*, winerror::*},
    um::{
        dsound::*, libloaderapi::*, mmsystem::TIMERR_NOERROR, timeapi::timeBeginPeriod,
        wingdi::*, winnt::LPCSTR, winuser::*, xinput::*,
    },
};

const WINDOW_NAME: &str = "Handmade Skeleton";
const WINDOW_CLASS_NAME: &str = "HandmadeSkeletonWindowClass";

const VK_W: i32 = 'W' as i32;
const VK_A: i32 = 'A' as i32;
const VK_S: i32 = 'S' as i32;
const VK_D: i32 = 'D' as i32;
const VK_Q: i32 = 'Q' as i32;
const VK_E: i32 = 'E' as i32;

fn win32_string(value: &str) -> Vec<u16> {
    OsStr::new(value).encode_wide().chain(once(0)).collect()
}

/// Owns the DirectSound object and its buffers, releasing whichever were
/// created when dropped.
struct DirectSoundDevice {
    direct_sound: LPDIRECTSOUND,
    primary_buffer: LPDIRECTSOUNDBUFFER,
    buffer: LPDIRECTSOUNDBUFFER,
}

impl DirectSoundDevice {
    // TODO: investigate WASAPI
    unsafe fn init(window: HWND, samples_per_second: u32, buffer_size: u32) -> Result<Self> {
        let mut direct_sound_ptr: LPDIRECTSOUND = null_mut();
        match DirectSoundCreate(null_mut(), &mut direct_sound_ptr, null_mut()) {
            DS_OK => {}
            e => {
                return Err(Error::DeviceUnavailable(format!(
                    "Couldn't create direct sound object: {:x}",
                    e
                )))
            }
        }
        let mut device = DirectSoundDevice {
            direct_sound: direct_sound_ptr,
            primary_buffer: null_mut(),
            buffer: null_mut(),
        };
        let direct_sound = &*device.direct_sound;

        let bits_per_sample = 16;
        let channels = 2;
        let block_alignment = channels * bits_per_sample / 8;
        debug_assert_eq!(u32::from(block_alignment), BYTES_PER_SAMPLE);
        let mut wave_format = WAVEFORMATEX {
            wFormatTag: WAVE_FORMAT_PCM,
            nChannels: channels,
            nSamplesPerSec: samples_per_second,
            nAvgBytesPerSec: samples_per_second * u32::from(block_alignment),
            nBlockAlign: block_alignment,
            wBitsPerSample: bits_per_sample,
            cbSize: 0,
        };

        // The primary buffer only exists to put the card into our format.
        match direct_sound.SetCooperativeLevel(window, DSSCL_PRIORITY) {
            DS_OK => {
                let mut buffer_description: DSBUFFERDESC = zeroed();
                buffer_description.dwSize = size_of::<DSBUFFERDESC>() as u32;
                buffer_description.dwFlags = DSBCAPS_PRIMARYBUFFER;

                match direct_sound.CreateSoundBuffer(
                    &buffer_description,
                    &mut device.primary_buffer,
                    null_mut(),
                ) {
                    DS_OK => match (*device.primary_buffer).SetFormat(&wave_format) {
                        DS_OK => info!("Successfully set the wave format"),
                        e => error!("Couldn't set the wave format: {:x}", e),
                    },
                    e => error!("Couldn't create the primary sound buffer: {:x}", e),
                }
            }
            e => error!("Couldn't set the cooperative level: {:x}", e),
        }

        let mut buffer_description: DSBUFFERDESC = zeroed();
        buffer_description.dwSize = size_of::<DSBUFFERDESC>() as u32;
        buffer_description.dwFlags = DSBCAPS_GETCURRENTPOSITION2;
        buffer_description.dwBufferBytes = buffer_size;
        buffer_description.lpwfxFormat = &mut wave_format;
        match direct_sound.CreateSoundBuffer(&buffer_description, &mut device.buffer, null_mut())
        {
            DS_OK => {
                info!("Secondary buffer created successfully");
                Ok(device)
            }
            e => Err(Error::DeviceUnavailable(format!(
                "Couldn't create the secondary sound buffer: {:x}",
                e
            ))),
        }
    }
}

impl Drop for DirectSoundDevice {
    fn drop(&mut self) {
        unsafe {
            if !self.buffer.is_null() {
                (*self.buffer).Release();
            }
            if !self.primary_buffer.is_null() {
                (*self.primary_buffer).Release();
            }
            (*self.direct_sound).Release();
        }
    }
}

unsafe fn sample_region<'a>(region: LPVOID, region_size: DWORD) -> &'a mut [i16] {
    if region.is_null() || region_size == 0 {
        &mut []
    } else {
        slice::from_raw_parts_mut(region as *mut i16, region_size as usize / 2)
    }
}

impl SoundDevice for DirectSoundDevice {
    fn play(&mut self) -> Result<()> {
        match unsafe { (*self.buffer).Play(0, 0, DSBPLAY_LOOPING) } {
            DS_OK => Ok(()),
            e => Err(Error::DeviceUnavailable(format!(
                "Couldn't start playback: {:x}",
                e
            ))),
        }
    }

    fn current_position(&mut self) -> Result<PlayCursors> {
        let mut play_cursor = 0;
        let mut write_cursor = 0;
        match unsafe { (*self.buffer).GetCurrentPosition(&mut play_cursor, &mut write_cursor) } {
            DS_OK => Ok(PlayCursors {
                play_cursor,
                write_cursor,
            }),
            e => Err(Error::DeviceUnavailable(format!(
                "GetCurrentPosition failed: {:x}",
                e
            ))),
        }
    }

    fn lock_region(
        &mut self,
        region: RingRegion,
        fill: &mut dyn FnMut(&mut [i16], &mut [i16]),
    ) -> Result<()> {
        let mut region1 = null_mut();
        let mut region1_size = 0;
        let mut region2 = null_mut();
        let mut region2_size = 0;
        unsafe {
            match (*self.buffer).Lock(
                region.byte_to_lock,
                region.bytes_to_write,
                &mut region1,
                &mut region1_size,
                &mut region2,
                &mut region2_size,
                0,
            ) {
                DS_OK => {
                    fill(
                        sample_region(region1, region1_size),
                        sample_region(region2, region2_size),
                    );
                    (*self.buffer).Unlock(region1, region1_size, region2, region2_size);
                    Ok(())
                }
                e => Err(Error::DeviceUnavailable(format!(
                    "Couldn't lock the sound buffer: {:x}",
                    e
                ))),
            }
        }
    }
}

type XInputGetStateFn = unsafe extern "system" fn(DWORD, *mut XINPUT_STATE) -> DWORD;

struct XInputDevice {
    get_state: XInputGetStateFn,
}

impl InputDevice for XInputDevice {
    fn controller_count(&self) -> usize {
        XUSER_MAX_COUNT as usize
    }

    fn get_state(&mut self, controller_index: usize) -> Result<GamepadState> {
        let mut controller_state: XINPUT_STATE = unsafe { zeroed() };
        match unsafe { (self.get_state)(controller_index as DWORD, &mut controller_state) } {
            ERROR_SUCCESS => {
                let pad = controller_state.Gamepad;
                Ok(GamepadState {
                    buttons: pad.wButtons,
                    thumb_lx: pad.sThumbLX,
                    thumb_ly: pad.sThumbLY,
                })
            }
            code => Err(Error::DeviceUnavailable(format!(
                "controller {} is not available: {}",
                controller_index, code
            ))),
        }
    }
}

/// Picks the newest XInput on the machine, or a stub when there is none.
fn load_xinput() -> Box<dyn InputDevice> {
    for library_name in &["xinput1_4.dll", "xinput1_3.dll", "xinput9_1_0.dll"] {
        let library_path = win32_string(library_name);
        let library = unsafe { LoadLibraryW(library_path.as_ptr()) };
        if library.is_null() {
            continue;
        }

        let get_state =
            unsafe { GetProcAddress(library, b"XInputGetState\0".as_ptr() as LPCSTR) };
        if get_state.is_null() {
            warn!("{} has no XInputGetState", library_name);
            continue;
        }

        info!("loaded {}", library_name);
        return Box::new(XInputDevice {
            get_state: unsafe { transmute::<FARPROC, XInputGetStateFn>(get_state) },
        });
    }

    warn!("XInput is not available, gamepads are disabled");
    Box::new(StubInput)
}

struct GdiDisplay {
    window: HWND,
}

impl Display for GdiDisplay {
    fn present(&mut self, surface: &PixelSurface) -> Result<()> {
        unsafe {
            let device_context = GetDC(self.window);
            if device_context.is_null() {
                return Err(Error::Platform("GetDC failed".into()));
            }
            display_buffer_in_window(surface, device_context);
            ReleaseDC(self.window, device_context);
        }
        Ok(())
    }
}

unsafe fn display_buffer_in_window(surface: &PixelSurface, device_context: HDC) {
    let width = surface.width() as i32;
    let height = surface.height() as i32;

    let mut info: BITMAPINFO = zeroed();
    info.bmiHeader.biSize = size_of::<BITMAPINFOHEADER>() as _;
    info.bmiHeader.biWidth = width;
    // a negative height makes the bitmap top-down
    info.bmiHeader.biHeight = -height;
    info.bmiHeader.biPlanes = 1;
    info.bmiHeader.biBitCount = 32;
    info.bmiHeader.biCompression = BI_RGB;

    // For prototyping purposes, we're going to always blit
    // 1-to-1 pixels to make sure we don't introduce artifacts with
    // stretching while we are learning to code the renderer
    StretchDIBits(
        device_context,
        0,
        0,
        width,
        height,
        0,
        0,
        width,
        height,
        surface.memory().as_ptr() as *const c_void,
        &info,
        DIB_RGB_COLORS,
        SRCCOPY,
    );
}

unsafe extern "system" fn main_window_callback(
    window: HWND,
    message: UINT,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    match message {
        WM_CLOSE | WM_DESTROY => {
            PostQuitMessage(0);
            0
        }
        WM_KEYUP | WM_KEYDOWN => {
            error!("Keyboard input came in through a non-dispatch message!");
            0
        }
        WM_PAINT => {
            // the next tick repaints the whole window
            let mut paint = PAINTSTRUCT::default();
            BeginPaint(window, &mut paint);
            EndPaint(window, &paint);
            0
        }
        _ => DefWindowProcW(window, message, w_param, l_param),
    }
}

fn keyboard_button(keyboard: &mut ControllerInput, vk_code: i32) -> Option<&mut ButtonState> {
    let button = match vk_code {
        VK_W => &mut keyboard.move_up,
        VK_A => &mut keyboard.move_left,
        VK_S => &mut keyboard.move_down,
        VK_D => &mut keyboard.move_right,
        VK_Q => &mut keyboard.left_shoulder,
        VK_E => &mut keyboard.right_shoulder,
        VK_UP => &mut keyboard.action_up,
        VK_DOWN => &mut keyboard.action_down,
        VK_LEFT => &mut keyboard.action_left,
        VK_RIGHT => &mut keyboard.action_right,
        VK_ESCAPE => &mut keyboard.back,
        VK_SPACE => &mut keyboard.start,
        _ => return None,
    };
    Some(button)
}

fn process_pending_messages(context: &mut Context) {
    let mut message: MSG = unsafe { zeroed() };
    while unsafe { PeekMessageW(&mut message, null_mut(), 0, 0, PM_REMOVE) } != 0 {
        match message.message {
            WM_QUIT => context.running = false,
            // letting windows handle WM_SYSKEYUP and WM_SYSKEYDOWN
            // so Alt-F4 keeps working
            WM_KEYDOWN | WM_KEYUP => {
                let vk_code = message.wParam as i32;
                let was_down = message.lParam & (1 << 30) != 0;
                let is_down = message.lParam & (1 << 31) == 0;

                if was_down != is_down {
                    let keyboard = context.keyboard_controller();
                    if let Some(button) = keyboard_button(keyboard, vk_code) {
                        process_keyboard_message(button, is_down);
                        debug!("key {} down: {}", vk_code, is_down);
                    }
                    if vk_code == VK_ESCAPE && is_down {
                        context.running = false;
                    }
                }
            }
            _ => unsafe {
                TranslateMessage(&message);
                DispatchMessageW(&message);
            },
        }
    }
}

fn create_window(config: &Config) -> Result<HWND> {
    let class_name = win32_string(WINDOW_CLASS_NAME);
    let window_name = win32_string(WINDOW_NAME);
    unsafe {
        let window_class = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
            lpfnWndProc: Some(main_window_callback),
            hInstance: GetModuleHandleW(null_mut()),
            lpszClassName: class_name.as_ptr(),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hIcon: null_mut(),
            hCursor: null_mut(),
            hbrBackground: null_mut(),
            lpszMenuName: null_mut(),
        };

        if RegisterClassW(&window_class) == 0 {
            return Err(Error::Platform("Couldn't register window class".into()));
        }

        let window = CreateWindowExW(
            0,
            window_class.lpszClassName,
            window_name.as_ptr(),
            WS_OVERLAPPEDWINDOW | WS_VISIBLE,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            config.window_width,
            config.window_height,
            null_mut(),
            null_mut(),
            window_class.hInstance,
            null_mut(),
        );
        if window.is_null() {
            return Err(Error::Platform("Window wasn't created".into()));
        }

        Ok(window)
    }
}

pub fn main(config: Config) -> Result<()> {
    let mut context = Context::new(config)?;

    // Set the Windows scheduler granularity to 1ms
    // so that our sleep can be more granular
    let desired_scheduler_ms = 1;
    if unsafe { timeBeginPeriod(desired_scheduler_ms) } != TIMERR_NOERROR {
        warn!("could not set the scheduler granularity, frame pacing will be rough");
    }

    let window = create_window(&context.config)?;

    let mut sound: Box<dyn SoundDevice> = match unsafe {
        DirectSoundDevice::init(
            window,
            context.sound_output.samples_per_second,
            context.sound_output.sound_buffer_size,
        )
    } {
        Ok(device) => Box::new(device),
        Err(e) => {
            error!("{}", e);
            Box::new(NullSoundDevice)
        }
    };
    let mut input = load_xinput();
    let mut display = GdiDisplay { window };

    if let Err(e) = context.start_sound(sound.as_mut()) {
        warn!("Could not start sound: {}", e);
    }

    let mut clock = FrameClock::new(context.config.target_seconds_per_frame());
    while context.running {
        context.begin_frame();
        process_pending_messages(&mut context);
        if !context.running {
            break;
        }

        context.tick(sound.as_mut(), input.as_mut(), &mut display);
        clock.wait_for_frame_end();
    }

    info!("shutting down");
    Ok(())
}
